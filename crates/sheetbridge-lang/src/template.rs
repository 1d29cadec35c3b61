//! The template preprocessor
//!
//! Templates are parameterized, purely textual macros declared anywhere in a
//! configuration file as `template name(arg, ...) { body }`. Definitions are
//! collected left to right and excised from the text; every call site
//! `name(val, ...)` in the remaining text is then replaced by the body with
//! each formal substituted positionally. A newly found body is itself run
//! through every previously registered template, so templates can build on
//! earlier ones, and call sites may reference templates declared later in
//! the file.

use crate::error::{ParseError, ParseResult};
use lazy_regex::{regex, Lazy};
use regex::Regex;

static DEFINITION: &Lazy<Regex> =
    regex!(r"(?s)template\s+[a-zA-Z0-9_]+\s*\(\s*\w*(,\s*\w+\s*)*\s*\)\s*\{[^}]+\}");
static DEFINITION_GROUPS: &Lazy<Regex> = regex!(
    r"(?s)template\s+(?P<name>[a-zA-Z0-9_]+)\s*\(\s*(?P<args>\w*(,\s*\w+\s*)*)\s*\)\s*\{(?P<body>[^}]+)\}"
);
static CALL_ARGS: &Lazy<Regex> = regex!(r"\(\s*(?P<args>\w*(,\s*\w+\s*)*)\s*\)");

/// A parsed template: name, formal parameters and body text
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    name: String,
    /// Formals wrapped as `__name__`, the form they take inside the body
    params: Vec<String>,
    body: String,
}

impl Template {
    fn parse(definition: &str) -> ParseResult<Self> {
        let captures = DEFINITION_GROUPS.captures(definition).ok_or_else(|| {
            ParseError::Template(format!("syntax error in template {definition}"))
        })?;

        let params = captures["args"]
            .split(',')
            .map(str::trim)
            .filter(|arg| !arg.is_empty())
            .map(|arg| format!("__{arg}__"))
            .collect();

        Ok(Self {
            name: captures["name"].to_string(),
            params,
            body: captures["body"].to_string(),
        })
    }

    /// The template's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The formal parameters, in their `__name__` body form
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// The body text
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Substitute the given actuals positionally into the body
    pub fn substitute(&self, args: &[&str]) -> ParseResult<String> {
        if args.len() != self.params.len() {
            return Err(ParseError::Template(format!(
                "mismatched number of arguments of template {}: {:?}",
                self.name, args
            )));
        }

        let mut result = self.body.clone();
        for (param, value) in self.params.iter().zip(args) {
            result = result.replace(param.as_str(), value);
        }
        Ok(result)
    }

    /// Replace every call site of this template in the given text
    fn apply(&self, text: &str) -> ParseResult<String> {
        let call = Regex::new(&format!(
            r"\b{}\s*\(\w*(,\s*\w+\s*)*\)",
            regex::escape(&self.name)
        ))
        .expect("call pattern is well-formed");

        let mut result = String::with_capacity(text.len());
        let mut last = 0;
        for site in call.find_iter(text) {
            let args_text = CALL_ARGS
                .captures(site.as_str())
                .map(|c| c["args"].to_string())
                .unwrap_or_default();
            let args: Vec<&str> = args_text
                .split(',')
                .map(str::trim)
                .filter(|arg| !arg.is_empty())
                .collect();

            result.push_str(&text[last..site.start()]);
            result.push_str(&self.substitute(&args)?);
            last = site.end();
        }
        result.push_str(&text[last..]);
        Ok(result)
    }
}

/// The outcome of preprocessing: the expanded text plus the templates found
#[derive(Debug, Clone)]
pub struct Expansion {
    pub text: String,
    pub templates: Vec<Template>,
}

/// Collect every template definition and substitute every call site
pub fn expand(contents: &str) -> ParseResult<Expansion> {
    let mut templates: Vec<Template> = Vec::new();
    let mut text = String::with_capacity(contents.len());
    let mut last = 0;

    for definition in DEFINITION.find_iter(contents) {
        // a body may invoke templates declared before it
        let mut body = definition.as_str().to_string();
        for template in &templates {
            body = template.apply(&body)?;
        }
        templates.push(Template::parse(&body)?);

        text.push_str(&contents[last..definition.start()]);
        last = definition.end();
    }
    text.push_str(&contents[last..]);

    // call sites in the stripped text may reference any template, including
    // ones declared after them
    for template in &templates {
        text = template.apply(&text)?;
    }

    Ok(Expansion { text, templates })
}
