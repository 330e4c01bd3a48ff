//! Command template substitution
//!
//! Templates use named printf-style placeholders: `%(custom_build_dir)s` and
//! `%(custom_server_path)s`, with `%%` for a literal percent sign. Line
//! templates are split on whitespace first and every token is substituted on
//! its own, so values containing spaces stay a single argument.

use rbt_errors::BuildError;
use rbt_types::{CommandTemplate, Repository};

/// Values available to placeholders
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateVars<'a> {
    pub custom_build_dir: &'a str,
    pub custom_server_path: &'a str,
}

impl<'a> TemplateVars<'a> {
    /// Variables of `repo`, unset values substitute as empty strings
    #[must_use]
    pub fn from_repository(repo: &'a Repository) -> Self {
        Self {
            custom_build_dir: repo.custom_build_dir.as_deref().unwrap_or_default(),
            custom_server_path: repo.custom_server_path.as_deref().unwrap_or_default(),
        }
    }

    fn lookup(&self, name: &str) -> Option<&'a str> {
        match name {
            "custom_build_dir" => Some(self.custom_build_dir),
            "custom_server_path" => Some(self.custom_server_path),
            _ => None,
        }
    }
}

/// Tokenize `template` and substitute every token
///
/// # Errors
///
/// Returns [`BuildError::TemplateError`] for unknown variables, conversions
/// other than `s`, and dangling `%`.
pub fn render(template: &CommandTemplate, vars: &TemplateVars<'_>) -> Result<Vec<String>, BuildError> {
    template
        .tokens()
        .into_iter()
        .map(|token| substitute(token, vars))
        .collect()
}

/// Substitute placeholders in a single token
///
/// # Errors
///
/// Returns [`BuildError::TemplateError`] if the token is malformed.
pub fn substitute(token: &str, vars: &TemplateVars<'_>) -> Result<String, BuildError> {
    let fail = |reason: String| BuildError::TemplateError {
        template: token.to_string(),
        reason,
    };

    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('%') => out.push('%'),
            Some('(') => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some(')') => break,
                        Some(ch) => name.push(ch),
                        None => return Err(fail("unterminated placeholder name".to_string())),
                    }
                }
                let value = vars
                    .lookup(&name)
                    .ok_or_else(|| fail(format!("unknown variable '{name}'")))?;
                match chars.next() {
                    Some('s') => out.push_str(value),
                    Some(other) => {
                        return Err(fail(format!("unsupported conversion '%{other}'")));
                    }
                    None => return Err(fail("incomplete placeholder".to_string())),
                }
            }
            Some(other) => return Err(fail(format!("unsupported conversion '%{other}'"))),
            None => return Err(fail("incomplete format".to_string())),
        }
    }
    Ok(out)
}
