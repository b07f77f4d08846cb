//! Response-header transforms.
//!
//! A transform turns a [`HeaderSet`] into the source of a function that runs
//! at the edge on every viewer response. Output depends only on the input
//! rules and their order.

use edgesite_core::{HeaderRule, HeaderSet};
use serde_json::json;
use std::fmt;
use std::str::FromStr;

/// Renders header rules into deployable function source.
pub trait ResponseHeaderTransform {
    /// Short identifier, used on the command line and in logs.
    fn name(&self) -> &'static str;

    /// File the source is stored under inside the package.
    fn file_name(&self) -> &'static str;

    /// Runtime entry point.
    fn handler(&self) -> &'static str;

    fn render(&self, headers: &HeaderSet) -> String;
}

pub const LAMBDA_EDGE_PROLOGUE: &str = "'use strict';\n\
exports.handler = (event, context, callback) => {\n\
\x20 const response = event.Records[0].cf.response;\n\
\x20 const headers = response.headers;\n";

pub const LAMBDA_EDGE_EPILOGUE: &str = "  callback(null, response);\n};\n";

/// Node.js handler that sets each configured header on the CloudFront
/// response object.
///
/// ```text
/// headers["x-frame-options"] = [{key: "X-Frame-Options", value: "DENY"}];
/// ```
///
/// The runtime indexes headers by lower-cased name; `key` keeps the
/// configured spelling for the wire.
#[derive(Debug, Clone, Copy, Default)]
pub struct LambdaEdgeTemplate;

impl LambdaEdgeTemplate {
    fn statement(rule: &HeaderRule) -> String {
        format!(
            "  headers[\"{}\"] = [{{key: \"{}\", value: \"{}\"}}];\n",
            rule.lowercase_key(),
            rule.key(),
            js_string(rule.value())
        )
    }
}

impl ResponseHeaderTransform for LambdaEdgeTemplate {
    fn name(&self) -> &'static str {
        "lambda-edge"
    }

    fn file_name(&self) -> &'static str {
        "index.js"
    }

    fn handler(&self) -> &'static str {
        "index.handler"
    }

    fn render(&self, headers: &HeaderSet) -> String {
        let body = headers
            .iter()
            .map(Self::statement)
            .fold(String::new(), |acc, stmt| acc + &stmt);
        format!("{LAMBDA_EDGE_PROLOGUE}{body}{LAMBDA_EDGE_EPILOGUE}")
    }
}

/// Escape a value for a double-quoted JavaScript string literal.
///
/// Header names never need this: they are restricted to token characters.
fn js_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c => out.push(c),
        }
    }
    out
}

/// Declarative rule document for hosts that apply header rules natively
/// instead of running code.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderRuleDocument;

impl ResponseHeaderTransform for HeaderRuleDocument {
    fn name(&self) -> &'static str {
        "rules"
    }

    fn file_name(&self) -> &'static str {
        "headers.json"
    }

    fn handler(&self) -> &'static str {
        "headers.json"
    }

    fn render(&self, headers: &HeaderSet) -> String {
        let set: Vec<_> = headers
            .iter()
            .map(|rule| {
                json!({
                    "name": rule.lowercase_key(),
                    "key": rule.key(),
                    "value": rule.value(),
                })
            })
            .collect();
        let doc = json!({
            "version": 1,
            "event": "viewer-response",
            "set": set,
        });
        format!("{doc:#}\n")
    }
}

/// Transform selectable from configuration or the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransformKind {
    #[default]
    LambdaEdge,
    Rules,
}

impl TransformKind {
    pub fn transform(&self) -> Box<dyn ResponseHeaderTransform> {
        match self {
            TransformKind::LambdaEdge => Box::new(LambdaEdgeTemplate),
            TransformKind::Rules => Box::new(HeaderRuleDocument),
        }
    }
}

impl FromStr for TransformKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lambda-edge" => Ok(TransformKind::LambdaEdge),
            "rules" => Ok(TransformKind::Rules),
            other => Err(format!(
                "unsupported transform: {other}. Supported: lambda-edge, rules"
            )),
        }
    }
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.transform().name())
    }
}
