//! Placeholder substitution for bundled JavaScript/TypeScript templates.
//!
//! Two placeholder forms are recognised:
//!
//! - a string literal whose whole value is `%name%`, e.g. `projectId: '%projectId%'`
//! - an identifier `__BOOL__name__`, e.g. `autoUpdates: __BOOL__autoUpdates__`
//!
//! The source is scanned token by token so that placeholders inside comments
//! or template literals are never touched. Everything except the replaced
//! tokens is copied through byte for byte. Replaced string literals are always
//! written single-quoted.

use std::collections::BTreeMap;

use crate::error::{Result, ScaffoldError};

/// A value bound to a placeholder name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateValue {
    String(String),
    Bool(bool),
}

impl From<&str> for TemplateValue {
    fn from(value: &str) -> Self {
        TemplateValue::String(value.to_string())
    }
}

impl From<String> for TemplateValue {
    fn from(value: String) -> Self {
        TemplateValue::String(value)
    }
}

impl From<bool> for TemplateValue {
    fn from(value: bool) -> Self {
        TemplateValue::Bool(value)
    }
}

/// Placeholder name to value.
pub type TemplateVariables = BTreeMap<String, TemplateValue>;

/// Options for [`process_template`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstitutionOptions {
    /// Replace `__BOOL__name__` identifiers.
    pub include_booleans: bool,
}

const BOOL_PREFIX: &str = "__BOOL__";
const BOOL_SUFFIX: &str = "__";

/// Substitute all placeholders in `source`.
///
/// Every placeholder must be bound; an unbound one fails the whole template.
///
/// The scanner knows comments, strings, template literals and identifiers
/// only. Regex literals and JSX text are not recognised, so an apostrophe in
/// either (`/don't/`, `<p>Don't</p>`) reads as an unterminated string and
/// fails with [`ScaffoldError::TemplateSyntax`]. Only the generated config
/// sources are run through this function.
pub fn process_template(
    source: &str,
    variables: &TemplateVariables,
    options: SubstitutionOptions,
) -> Result<String> {
    let bytes = source.as_bytes();
    let mut output = String::with_capacity(source.len());
    let mut pos = 0;

    while pos < bytes.len() {
        let start = pos;
        match bytes[pos] {
            b'/' if bytes.get(pos + 1) == Some(&b'/') => {
                pos = find_from(bytes, pos + 2, b"\n").unwrap_or(bytes.len());
                output.push_str(&source[start..pos]);
            }
            b'/' if bytes.get(pos + 1) == Some(&b'*') => {
                let end = find_from(bytes, pos + 2, b"*/")
                    .ok_or_else(|| syntax(start, "unterminated block comment"))?;
                pos = end + 2;
                output.push_str(&source[start..pos]);
            }
            quote @ (b'\'' | b'"') => {
                pos = string_end(bytes, pos, quote)?;
                let inner = &source[start + 1..pos - 1];
                match placeholder_name(inner) {
                    Some(name) => output.push_str(&quote_literal(string_value(name, variables)?)),
                    None => output.push_str(&source[start..pos]),
                }
            }
            b'`' => {
                pos = template_literal_end(bytes, pos)?;
                output.push_str(&source[start..pos]);
            }
            b if is_ident_start(b) => {
                while pos < bytes.len() && is_ident_part(bytes[pos]) {
                    pos += 1;
                }
                let ident = &source[start..pos];
                match bool_placeholder(ident).filter(|_| options.include_booleans) {
                    Some(name) => output.push_str(bool_value(name, variables)?),
                    None => output.push_str(ident),
                }
            }
            b if b.is_ascii_digit() => {
                // Numeric literals like 0x1F must not start an identifier.
                while pos < bytes.len() && (is_ident_part(bytes[pos]) || bytes[pos] == b'.') {
                    pos += 1;
                }
                output.push_str(&source[start..pos]);
            }
            _ => {
                let len = source[pos..].chars().next().map_or(1, char::len_utf8);
                pos += len;
                output.push_str(&source[start..pos]);
            }
        }
    }

    Ok(output)
}

fn syntax(offset: usize, message: &str) -> ScaffoldError {
    ScaffoldError::TemplateSyntax {
        offset,
        message: message.to_string(),
    }
}

fn find_from(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    bytes
        .get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + from)
}

/// Index just past the closing quote of the string literal at `start`.
fn string_end(bytes: &[u8], start: usize, quote: u8) -> Result<usize> {
    let mut pos = start + 1;
    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 2,
            b'\n' => break,
            b if b == quote => return Ok(pos + 1),
            _ => pos += 1,
        }
    }
    Err(syntax(start, "unterminated string literal"))
}

/// Index just past the closing backtick of the template literal at `start`.
///
/// Interpolations are copied as-is; braces are balanced so a backtick inside
/// `${...}` does not end the literal early.
fn template_literal_end(bytes: &[u8], start: usize) -> Result<usize> {
    let mut pos = start + 1;
    let mut depth = 0usize;
    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 2,
            b'$' if depth == 0 && bytes.get(pos + 1) == Some(&b'{') => {
                depth = 1;
                pos += 2;
            }
            b'{' if depth > 0 => {
                depth += 1;
                pos += 1;
            }
            b'}' if depth > 0 => {
                depth -= 1;
                pos += 1;
            }
            b'`' if depth == 0 => return Ok(pos + 1),
            quote @ (b'\'' | b'"') if depth > 0 => pos = string_end(bytes, pos, quote)?,
            b'`' => pos = template_literal_end(bytes, pos)?,
            _ => pos += 1,
        }
    }
    Err(syntax(start, "unterminated template literal"))
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$'
}

fn is_ident_part(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}

/// `%name%` with no other percent signs and no escapes.
fn placeholder_name(literal: &str) -> Option<&str> {
    let name = literal.strip_prefix('%')?.strip_suffix('%')?;
    (!name.is_empty() && !name.contains(['%', '\\'])).then_some(name)
}

fn bool_placeholder(ident: &str) -> Option<&str> {
    let name = ident.strip_prefix(BOOL_PREFIX)?.strip_suffix(BOOL_SUFFIX)?;
    (!name.is_empty()).then_some(name)
}

fn lookup<'a>(name: &str, variables: &'a TemplateVariables) -> Result<&'a TemplateValue> {
    variables
        .get(name)
        .ok_or_else(|| ScaffoldError::UndefinedTemplateVariable {
            name: name.to_string(),
        })
}

/// Non-string values render as an empty string in string positions.
fn string_value<'a>(name: &str, variables: &'a TemplateVariables) -> Result<&'a str> {
    Ok(match lookup(name, variables)? {
        TemplateValue::String(value) => value,
        TemplateValue::Bool(_) => "",
    })
}

fn bool_value(name: &str, variables: &TemplateVariables) -> Result<&'static str> {
    match lookup(name, variables)? {
        TemplateValue::Bool(true) => Ok("true"),
        TemplateValue::Bool(false) => Ok("false"),
        TemplateValue::String(_) => Err(ScaffoldError::TemplateVariableType {
            name: name.to_string(),
        }),
    }
}

fn quote_literal(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '\'' => quoted.push_str("\\'"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            c => quoted.push(c),
        }
    }
    quoted.push('\'');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(entries: &[(&str, TemplateValue)]) -> TemplateVariables {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn render(source: &str, variables: &TemplateVariables) -> Result<String> {
        process_template(
            source,
            variables,
            SubstitutionOptions {
                include_booleans: true,
            },
        )
    }

    #[test]
    fn replaces_string_placeholders_and_keeps_the_rest() {
        let source = "export default defineConfig({\n  projectId: \"%projectId%\",\n  dataset: '%dataset%', // main\n})\n";
        let variables = vars(&[
            ("dataset", "production".into()),
            ("projectId", "abc123".into()),
        ]);

        let output = render(source, &variables).unwrap();
        assert_eq!(
            output,
            "export default defineConfig({\n  projectId: 'abc123',\n  dataset: 'production', // main\n})\n"
        );
    }

    #[test]
    fn missing_variable_is_an_error() {
        let variables = vars(&[("projectId", "abc123".into())]);
        let result = render("const c = {dataset: '%dataset%'}", &variables);
        assert!(matches!(
            result,
            Err(ScaffoldError::UndefinedTemplateVariable { name }) if name == "dataset"
        ));
    }

    #[test]
    fn boolean_placeholders() {
        let variables = vars(&[("autoUpdates", true.into()), ("strict", false.into())]);
        let output = render(
            "autoUpdates: __BOOL__autoUpdates__, strict: __BOOL__strict__,",
            &variables,
        )
        .unwrap();
        assert_eq!(output, "autoUpdates: true, strict: false,");
    }

    #[test]
    fn boolean_placeholders_are_left_alone_when_disabled() {
        let source = "autoUpdates: __BOOL__autoUpdates__";
        let output = process_template(source, &TemplateVariables::new(), SubstitutionOptions::default())
            .unwrap();
        assert_eq!(output, source);
    }

    #[test]
    fn boolean_placeholder_requires_boolean() {
        let variables = vars(&[("autoUpdates", "yes".into())]);
        let result = render("x = __BOOL__autoUpdates__", &variables);
        assert!(matches!(result, Err(ScaffoldError::TemplateVariableType { .. })));
    }

    #[test]
    fn boolean_value_in_string_position_is_empty() {
        let variables = vars(&[("flag", true.into())]);
        assert_eq!(render("x = '%flag%'", &variables).unwrap(), "x = ''");
    }

    #[test]
    fn non_placeholder_strings_are_untouched() {
        let variables = TemplateVariables::new();
        let source = r#"a = "100%"; b = '%a%b%'; c = "%%"; d = "it\"s";"#;
        assert_eq!(render(source, &variables).unwrap(), source);
    }

    #[test]
    fn comments_and_template_literals_are_skipped() {
        let variables = TemplateVariables::new();
        let source = "// '%missing%'\n/* __BOOL__missing__ */\nconst t = `${'%missing%'} %missing%`\n";
        assert_eq!(render(source, &variables).unwrap(), source);
    }

    #[test]
    fn replacement_values_are_escaped() {
        let variables = vars(&[("title", "Bob's \\ blog".into())]);
        assert_eq!(
            render("title: \"%title%\"", &variables).unwrap(),
            r"title: 'Bob\'s \\ blog'"
        );
    }

    #[test]
    fn identifiers_containing_the_prefix_are_not_confused() {
        let variables = TemplateVariables::new();
        let source = "x__BOOL__y__ = 1; __BOOL____ = 0x1F;";
        assert_eq!(render(source, &variables).unwrap(), source);
    }

    #[test]
    fn output_is_deterministic() {
        let variables = vars(&[("projectId", "p".into())]);
        let source = "a('%projectId%'); b(\"%projectId%\")";
        let first = render(source, &variables).unwrap();
        assert_eq!(first, render(source, &variables).unwrap());
        assert_eq!(first, "a('p'); b('p')");
    }

    #[test]
    fn unterminated_tokens_are_syntax_errors() {
        let variables = TemplateVariables::new();
        for source in ["x = 'abc", "x = \"abc\ny\"", "/* open", "`open ${a}"] {
            assert!(
                matches!(render(source, &variables), Err(ScaffoldError::TemplateSyntax { .. })),
                "{source} should fail"
            );
        }
    }

    #[test]
    fn regex_literals_and_jsx_text_are_not_supported() {
        let variables = TemplateVariables::new();
        for source in ["const re = /don't/;\n", "const p = <p>Don't</p>;\n"] {
            assert!(
                matches!(render(source, &variables), Err(ScaffoldError::TemplateSyntax { .. })),
                "{source} should fail"
            );
        }
    }

    #[test]
    fn non_ascii_text_is_preserved() {
        let variables = vars(&[("name", "Café".into())]);
        assert_eq!(
            render("// ünïcode\nname: '%name%' → ok", &variables).unwrap(),
            "// ünïcode\nname: 'Café' → ok"
        );
    }
}
