//! USDA (ASCII) parser.
//!
//! Recursive-descent parser over the tokens produced by [`super::lexer`],
//! building a [`SceneDocument`].
//!
//! # Supported Syntax
//!
//! - `#usda 1.0` header with optional layer metadata `( ... )`
//! - `def|over|class [Type] "Name" ( metadata ) { ... }`
//! - prim metadata, including `variants = { string set = "sel" }` and
//!   `variantSets = [...]` with optional list-op prefixes
//! - attributes: `[custom] [uniform] type[[]] name [= value] [( metadata )]`
//! - `name.timeSamples = { t: value, ... }` and `name.connect = <path>`
//! - relationships: `rel name = <path> | [<path>, ...]`
//! - `variantSet "name" = { "variant" { ... } ... }` (bodies are skipped)

use indexmap::IndexMap;
use thiserror::Error;

use super::lexer::{tokenize, Spanned, Token};
use crate::document::{DocumentError, Prim, SceneDocument, Specifier};
use crate::path::PrimPath;
use crate::value::{Attribute, Value};

/// Errors that can occur during USDA parsing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Parse error at line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("Unexpected end of file")]
    UnexpectedEof,

    #[error("Missing '#usda' header")]
    MissingHeader,

    #[error("Invalid number format at line {line}: {text}")]
    InvalidNumber { line: usize, text: String },

    #[error("Invalid document: {0}")]
    Document(#[from] DocumentError),
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// List-op prefixes accepted (and dropped) in front of metadata and properties.
const LIST_OPS: &[&str] = &["prepend", "append", "add", "delete", "reorder"];

/// Property qualifiers that may precede a type name or `rel`.
const QUALIFIERS: &[&str] = &["custom", "uniform", "varying", "config"];

/// USDA token-stream parser.
pub struct UsdaParser {
    tokens: Vec<Spanned>,
    pos: usize,
}

impl UsdaParser {
    /// Create a new parser from file contents.
    pub fn new(content: &str) -> ParseResult<Self> {
        Ok(Self {
            tokens: tokenize(content)?,
            pos: 0,
        })
    }

    /// Parse the whole layer.
    pub fn parse(&mut self) -> ParseResult<SceneDocument> {
        match self.advance() {
            Ok((_, Token::Magic(version))) => {
                if version != "1.0" {
                    log::warn!("Unexpected usda version {:?}, parsing anyway", version);
                }
            }
            _ => return Err(ParseError::MissingHeader),
        }

        let mut metadata = IndexMap::new();
        if self.is_punct('(') {
            for (key, value) in self.parse_metadata_block()? {
                metadata.insert(key, value);
            }
        }

        let root = PrimPath::root();
        let mut roots = Vec::new();
        while self.peek().is_some() {
            roots.push(self.parse_prim(&root)?);
        }

        let document = SceneDocument::from_roots(metadata, roots)?;
        log::debug!("Parsed {} prims", document.len());
        Ok(document)
    }

    // ------------------------------------------------------------------
    // Token helpers
    // ------------------------------------------------------------------

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|(line, _)| *line)
            .unwrap_or(0)
    }

    fn advance(&mut self) -> ParseResult<Spanned> {
        let token = self.tokens.get(self.pos).cloned().ok_or(ParseError::UnexpectedEof)?;
        self.pos += 1;
        Ok(token)
    }

    fn is_punct(&self, c: char) -> bool {
        self.peek() == Some(&Token::Punctuation(c))
    }

    fn is_ident(&self, word: &str) -> bool {
        matches!(self.peek(), Some(Token::Identifier(s)) if s == word)
    }

    fn eat_punct(&mut self, c: char) -> bool {
        if self.is_punct(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, c: char) -> ParseResult<()> {
        let (line, token) = self.advance()?;
        if token == Token::Punctuation(c) {
            Ok(())
        } else {
            Err(ParseError::Syntax {
                line,
                message: format!("Expected '{}', found {:?}", c, token),
            })
        }
    }

    fn expect_identifier(&mut self) -> ParseResult<String> {
        match self.advance()? {
            (_, Token::Identifier(s)) => Ok(s),
            (line, other) => Err(ParseError::Syntax {
                line,
                message: format!("Expected identifier, found {:?}", other),
            }),
        }
    }

    fn expect_string(&mut self) -> ParseResult<String> {
        match self.advance()? {
            (_, Token::String(s)) => Ok(s),
            (line, other) => Err(ParseError::Syntax {
                line,
                message: format!("Expected string, found {:?}", other),
            }),
        }
    }

    fn syntax(&self, message: impl Into<String>) -> ParseError {
        ParseError::Syntax {
            line: self.line(),
            message: message.into(),
        }
    }

    /// Skip separators allowed between list entries.
    fn eat_separator(&mut self) {
        while self.eat_punct(',') || self.eat_punct(';') {}
    }

    // ------------------------------------------------------------------
    // Metadata
    // ------------------------------------------------------------------

    /// Parse `( key = value ... )`. A bare string is recorded as `doc`.
    fn parse_metadata_block(&mut self) -> ParseResult<Vec<(String, Value)>> {
        self.expect_punct('(')?;
        let mut entries = Vec::new();

        loop {
            if self.eat_punct(')') {
                break;
            }

            if let Some(Token::String(doc)) = self.peek().cloned() {
                self.pos += 1;
                entries.push(("doc".to_string(), Value::String(doc)));
                self.eat_separator();
                continue;
            }

            let mut key = self.expect_identifier()?;
            if LIST_OPS.contains(&key.as_str()) && matches!(self.peek(), Some(Token::Identifier(_))) {
                log::debug!("Dropping list-op '{}' at line {}", key, self.line());
                key = self.expect_identifier()?;
            }

            self.expect_punct('=')?;
            let value = self.parse_value()?;
            entries.push((key, value));
            self.eat_separator();
        }

        Ok(entries)
    }

    // ------------------------------------------------------------------
    // Prims
    // ------------------------------------------------------------------

    fn parse_prim(&mut self, parent: &PrimPath) -> ParseResult<Prim> {
        let (line, token) = self.advance()?;
        let specifier = match &token {
            Token::Identifier(s) if s == "def" => Specifier::Def,
            Token::Identifier(s) if s == "over" => Specifier::Over,
            Token::Identifier(s) if s == "class" => Specifier::Class,
            other => {
                return Err(ParseError::Syntax {
                    line,
                    message: format!("Expected prim specifier, found {:?}", other),
                })
            }
        };

        let type_name = match self.peek() {
            Some(Token::Identifier(_)) => Some(self.expect_identifier()?),
            _ => None,
        };

        let name = self.expect_string()?;
        let path = parent.child(&name).map_err(|e| ParseError::Syntax {
            line,
            message: e.to_string(),
        })?;

        let mut prim = Prim::new(path);
        prim.specifier = specifier;
        prim.type_name = type_name;

        if self.is_punct('(') {
            for (key, value) in self.parse_metadata_block()? {
                self.apply_prim_metadata(&mut prim, key, value)?;
            }
        }

        self.expect_punct('{')?;
        loop {
            if self.eat_punct('}') {
                break;
            }
            match self.peek() {
                None => return Err(ParseError::UnexpectedEof),
                Some(Token::Identifier(word)) if matches!(word.as_str(), "def" | "over" | "class") => {
                    let child = self.parse_prim(&prim.path)?;
                    prim.children.push(child);
                }
                Some(Token::Identifier(word)) if word == "variantSet" => {
                    self.parse_variant_set_block(&mut prim)?;
                }
                _ => self.parse_property(&mut prim)?,
            }
            self.eat_separator();
        }

        Ok(prim)
    }

    fn apply_prim_metadata(&self, prim: &mut Prim, key: String, value: Value) -> ParseResult<()> {
        match key.as_str() {
            "variants" => {
                let Value::Dictionary(selections) = value else {
                    return Err(self.syntax(format!("variants on {} must be a dictionary", prim.path)));
                };
                for (set_name, selection) in selections {
                    let vset = prim.variant_sets.entry(set_name).or_default();
                    vset.selection = selection.as_str().map(str::to_string);
                }
            }
            "variantSets" => {
                let names = match value {
                    Value::Array(items) => items,
                    single => vec![single],
                };
                for name in names {
                    match name.as_str() {
                        Some(n) => {
                            prim.variant_sets.entry(n.to_string()).or_default();
                        }
                        None => return Err(self.syntax(format!("Invalid variant set name on {}", prim.path))),
                    }
                }
            }
            _ => {
                prim.metadata.insert(key, value);
            }
        }
        Ok(())
    }

    /// Parse `variantSet "name" = { "variant" { ... } ... }`.
    fn parse_variant_set_block(&mut self, prim: &mut Prim) -> ParseResult<()> {
        self.expect_identifier()?; // variantSet
        let set_name = self.expect_string()?;
        self.expect_punct('=')?;
        self.expect_punct('{')?;

        loop {
            if self.eat_punct('}') {
                break;
            }
            let variant = self.expect_string()?;
            if self.is_punct('(') {
                self.parse_metadata_block()?;
            }
            self.expect_punct('{')?;
            if self.skip_block()? {
                log::warn!(
                    "Content of variant {}:{{{}={}}} is not retained",
                    prim.path,
                    set_name,
                    variant
                );
            }
            prim.variant_sets
                .entry(set_name.clone())
                .or_default()
                .variants
                .insert(variant);
        }

        Ok(())
    }

    /// Consume tokens up to the brace closing an already-opened block.
    /// Returns whether the block had any content.
    fn skip_block(&mut self) -> ParseResult<bool> {
        let mut depth = 1;
        let mut had_content = false;
        while depth > 0 {
            match self.advance()?.1 {
                Token::Punctuation('{') => depth += 1,
                Token::Punctuation('}') => depth -= 1,
                _ => {}
            }
            if depth > 0 {
                had_content = true;
            }
        }
        Ok(had_content)
    }

    // ------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------

    fn parse_property(&mut self, prim: &mut Prim) -> ParseResult<()> {
        let mut custom = false;
        let mut uniform = false;

        loop {
            let word = match self.peek() {
                Some(Token::Identifier(w)) => w.clone(),
                Some(other) => return Err(self.syntax(format!("Unexpected token in prim body: {:?}", other))),
                None => return Err(ParseError::UnexpectedEof),
            };
            if LIST_OPS.contains(&word.as_str()) {
                self.pos += 1;
            } else if QUALIFIERS.contains(&word.as_str()) {
                self.pos += 1;
                custom |= word == "custom";
                uniform |= word == "uniform";
            } else {
                break;
            }
        }

        if self.is_ident("rel") {
            self.pos += 1;
            return self.parse_relationship(prim);
        }

        let mut type_name = self.expect_identifier()?;
        if self.eat_punct('[') {
            self.expect_punct(']')?;
            type_name.push_str("[]");
        }
        let name = self.expect_identifier()?;

        if let Some(base) = name.strip_suffix(".timeSamples") {
            self.expect_punct('=')?;
            let samples = self.parse_time_samples()?;
            let attr = declare(prim, base, &type_name, custom, uniform);
            attr.time_samples = samples;
            return Ok(());
        }

        if let Some(base) = name.strip_suffix(".connect") {
            self.expect_punct('=')?;
            let targets = self.parse_target_list()?;
            let attr = declare(prim, base, &type_name, custom, uniform);
            attr.connections.extend(targets);
            return Ok(());
        }

        let default = if self.eat_punct('=') {
            Some(self.parse_value()?)
        } else {
            None
        };
        let metadata = if self.is_punct('(') {
            self.parse_metadata_block()?
        } else {
            Vec::new()
        };

        let attr = declare(prim, &name, &type_name, custom, uniform);
        if default.is_some() {
            attr.default = default;
        }
        attr.metadata.extend(metadata);
        Ok(())
    }

    fn parse_relationship(&mut self, prim: &mut Prim) -> ParseResult<()> {
        let name = self.expect_identifier()?;
        let targets = if self.eat_punct('=') {
            self.parse_target_list()?
        } else {
            Vec::new()
        };
        if self.is_punct('(') {
            self.parse_metadata_block()?;
        }
        prim.relationships.entry(name).or_default().extend(targets);
        Ok(())
    }

    /// `<path>`, `[<path>, ...]` or `None`.
    fn parse_target_list(&mut self) -> ParseResult<Vec<String>> {
        match self.parse_value()? {
            Value::Path(p) => Ok(vec![p]),
            Value::Token(t) if t == "None" => Ok(Vec::new()),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Path(p) => Ok(p),
                    other => Err(self.syntax(format!("Expected target path, found {:?}", other))),
                })
                .collect(),
            other => Err(self.syntax(format!("Expected target path list, found {:?}", other))),
        }
    }

    fn parse_time_samples(&mut self) -> ParseResult<Vec<(f64, Value)>> {
        self.expect_punct('{')?;
        let mut samples = Vec::new();
        loop {
            if self.eat_punct('}') {
                break;
            }
            let (line, token) = self.advance()?;
            let time = match token {
                Token::Number(text) => text
                    .parse::<f64>()
                    .map_err(|_| ParseError::InvalidNumber { line, text })?,
                other => {
                    return Err(ParseError::Syntax {
                        line,
                        message: format!("Expected time code, found {:?}", other),
                    })
                }
            };
            self.expect_punct(':')?;
            samples.push((time, self.parse_value()?));
            self.eat_separator();
        }
        Ok(samples)
    }

    // ------------------------------------------------------------------
    // Values
    // ------------------------------------------------------------------

    fn parse_value(&mut self) -> ParseResult<Value> {
        let (line, token) = self.advance()?;
        match token {
            Token::String(s) => Ok(Value::String(s)),
            Token::Number(text) => parse_number(line, text),
            Token::Identifier(word) => Ok(match word.as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                "inf" | "nan" | "NaN" => Value::Float(word.parse().unwrap_or(f64::NAN)),
                _ => Value::Token(word),
            }),
            Token::Path(p) => Ok(Value::Path(p)),
            Token::Asset(asset) => {
                if let Some(Token::Path(prim)) = self.peek().cloned() {
                    self.pos += 1;
                    Ok(Value::Reference { asset, prim: Some(prim) })
                } else {
                    Ok(Value::Asset(asset))
                }
            }
            Token::Punctuation('(') => Ok(Value::Tuple(self.parse_sequence(')')?)),
            Token::Punctuation('[') => Ok(Value::Array(self.parse_sequence(']')?)),
            Token::Punctuation('{') => Ok(Value::Dictionary(self.parse_dictionary_body()?)),
            other => Err(ParseError::Syntax {
                line,
                message: format!("Expected value, found {:?}", other),
            }),
        }
    }

    /// Comma-separated values up to `close` (opening token already consumed).
    fn parse_sequence(&mut self, close: char) -> ParseResult<Vec<Value>> {
        let mut items = Vec::new();
        loop {
            if self.eat_punct(close) {
                break;
            }
            items.push(self.parse_value()?);
            if !self.eat_punct(',') && !self.is_punct(close) {
                return Err(self.syntax(format!("Expected ',' or '{}'", close)));
            }
        }
        Ok(items)
    }

    /// `type key = value` entries up to `}` (opening brace already consumed).
    fn parse_dictionary_body(&mut self) -> ParseResult<IndexMap<String, Value>> {
        let mut entries = IndexMap::new();
        loop {
            if self.eat_punct('}') {
                break;
            }

            let type_name = self.expect_identifier()?;
            if self.eat_punct('[') {
                self.expect_punct(']')?;
            }

            let key = match self.advance()? {
                (_, Token::Identifier(s)) | (_, Token::String(s)) => s,
                (line, other) => {
                    return Err(ParseError::Syntax {
                        line,
                        message: format!("Expected dictionary key, found {:?}", other),
                    })
                }
            };
            self.expect_punct('=')?;
            let value = self.parse_value()?;
            if type_name == "dictionary" && !matches!(value, Value::Dictionary(_)) {
                return Err(self.syntax(format!("Entry {} is declared as a dictionary", key)));
            }
            entries.insert(key, value);
            self.eat_separator();
        }
        Ok(entries)
    }
}

/// Fetch or create an attribute, folding in declaration qualifiers.
fn declare<'p>(prim: &'p mut Prim, name: &str, type_name: &str, custom: bool, uniform: bool) -> &'p mut Attribute {
    let attr = prim
        .attributes
        .entry(name.to_string())
        .or_insert_with(|| Attribute::declared(type_name));
    attr.custom |= custom;
    attr.uniform |= uniform;
    attr
}

fn parse_number(line: usize, text: String) -> ParseResult<Value> {
    let is_float = text.contains(['.', 'e', 'E']) || text.ends_with("inf");
    if !is_float {
        if let Ok(i) = text.parse::<i64>() {
            return Ok(Value::Int(i));
        }
    }
    text.parse::<f64>()
        .map(Value::Float)
        .map_err(|_| ParseError::InvalidNumber { line, text })
}

/// Parse a USDA string into a scene document.
pub fn parse_usda(content: &str) -> ParseResult<SceneDocument> {
    let mut parser = UsdaParser::new(content)?;
    parser.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> PrimPath {
        PrimPath::parse(s).unwrap()
    }

    #[test]
    fn test_parse_layer_metadata() {
        let usda = r#"#usda 1.0
(
    "A demo layer"
    defaultPrim = "World"
    metersPerUnit = 0.01
    startTimeCode = 1
)

def Xform "World" {
}
"#;
        let doc = parse_usda(usda).unwrap();
        let meta = doc.metadata();
        assert_eq!(meta["doc"], Value::from("A demo layer"));
        assert_eq!(meta["defaultPrim"], Value::from("World"));
        assert_eq!(meta["metersPerUnit"], Value::Float(0.01));
        assert_eq!(meta["startTimeCode"], Value::Int(1));
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_parse_hierarchy_and_metadata() {
        let usda = r#"#usda 1.0

def Xform "World" (
    kind = "component"
    comment = """A randomized demo scene"""
    customData = {
        string color = "red"
        int count = 3
    }
)
{
    def Cube "Cube" (
        color = "red"
    )
    {
        double size = 1.5
    }

    over "Sphere"
    {
    }
}
"#;
        let doc = parse_usda(usda).unwrap();
        let world = doc.get(&path("/World")).unwrap();
        assert_eq!(world.type_name.as_deref(), Some("Xform"));
        assert_eq!(world.metadata["kind"], Value::from("component"));
        let Value::Dictionary(custom) = &world.metadata["customData"] else {
            panic!("Expected dictionary");
        };
        assert_eq!(custom["count"], Value::Int(3));

        let cube = doc.get(&path("/World/Cube")).unwrap();
        assert_eq!(cube.metadata["color"], Value::from("red"));
        assert_eq!(cube.attributes["size"], Attribute::new("double", Value::Float(1.5)));

        let sphere = doc.get(&path("/World/Sphere")).unwrap();
        assert_eq!(sphere.specifier, Specifier::Over);
        assert_eq!(sphere.type_name, None);
    }

    #[test]
    fn test_parse_attributes() {
        let usda = r#"#usda 1.0
def Cube "Cube" {
    custom double size = 2
    double3 xformOp:translate = (1, 2, 3)
    uniform token[] xformOpOrder = ["xformOp:translate"]
    color3f[] primvars:displayColor = [(0.1, 0.2, 0.3)] (
        interpolation = "constant"
    )
    point3f[] points
    double3 xformOp:translate.timeSamples = {
        0: (-10, 5, 20),
        48: (10, 5, 20),
    }
    token outputs:surface.connect = </Mat/Shader.outputs:surface>
}
"#;
        let doc = parse_usda(usda).unwrap();
        let cube = doc.get(&path("/Cube")).unwrap();

        let size = &cube.attributes["size"];
        assert!(size.custom);
        assert_eq!(size.default, Some(Value::Int(2)));

        let translate = &cube.attributes["xformOp:translate"];
        assert_eq!(translate.default, Some(Value::Tuple(vec![Value::Int(1), Value::Int(2), Value::Int(3)])));
        assert_eq!(translate.time_samples.len(), 2);
        assert_eq!(translate.time_samples[1].0, 48.0);

        let order = &cube.attributes["xformOpOrder"];
        assert!(order.uniform);
        assert_eq!(order.type_name, "token[]");

        let color = &cube.attributes["primvars:displayColor"];
        assert_eq!(color.metadata["interpolation"], Value::from("constant"));

        assert_eq!(cube.attributes["points"].default, None);
        assert_eq!(
            cube.attributes["outputs:surface"].connections,
            vec!["/Mat/Shader.outputs:surface".to_string()]
        );
    }

    #[test]
    fn test_parse_relationships() {
        let usda = r#"#usda 1.0
def Xform "World" {
    def Cube "Cube" {
        rel looksAt = [</World/Sphere>, </World/Cone>]
        prepend rel material:binding = </World/Looks/Red>
        rel proxyPrim
        rel empty = None
    }
}
"#;
        let doc = parse_usda(usda).unwrap();
        let cube = doc.get(&path("/World/Cube")).unwrap();
        let looks_at: Vec<_> = cube.relationships["looksAt"].iter().cloned().collect();
        assert_eq!(looks_at, vec!["/World/Sphere", "/World/Cone"]);
        assert!(cube.relationships["material:binding"].contains("/World/Looks/Red"));
        assert!(cube.relationships["proxyPrim"].is_empty());
        assert!(cube.relationships["empty"].is_empty());
    }

    #[test]
    fn test_parse_variant_sets() {
        let usda = r#"#usda 1.0
def Mesh "Mesh" (
    variants = {
        string materialVariant = "Glass"
    }
    prepend variantSets = ["materialVariant", "lod"]
)
{
    variantSet "materialVariant" = {
        "Metal" {
            def Material "Mat" {
                token outputs:surface
            }
        }
        "Glass" (
            doc = "see-through"
        ) {
        }
    }
}
"#;
        let doc = parse_usda(usda).unwrap();
        let mesh = doc.get(&path("/Mesh")).unwrap();
        let material = &mesh.variant_sets["materialVariant"];
        assert_eq!(material.selection.as_deref(), Some("Glass"));
        let names: Vec<_> = material.variants.iter().cloned().collect();
        assert_eq!(names, vec!["Metal", "Glass"]);
        assert!(mesh.variant_sets["lod"].variants.is_empty());
        // Variant bodies are not part of the flat model
        assert!(mesh.children.is_empty());
    }

    #[test]
    fn test_parse_reference_metadata() {
        let usda = r#"#usda 1.0
def Xform "Lucy" (
    references = @./lucy.usda@</Lucy>
    active = false
)
{
}
"#;
        let doc = parse_usda(usda).unwrap();
        let lucy = doc.get(&path("/Lucy")).unwrap();
        assert_eq!(
            lucy.metadata["references"],
            Value::Reference {
                asset: "./lucy.usda".to_string(),
                prim: Some("/Lucy".to_string())
            }
        );
        assert_eq!(lucy.metadata["active"], Value::Bool(false));
    }

    #[test]
    fn test_missing_header() {
        assert_eq!(parse_usda("def Xform \"World\" {}").unwrap_err(), ParseError::MissingHeader);
    }

    #[test]
    fn test_unclosed_prim() {
        let err = parse_usda("#usda 1.0\ndef Xform \"World\" {\n").unwrap_err();
        assert_eq!(err, ParseError::UnexpectedEof);
    }

    #[test]
    fn test_syntax_error_reports_line() {
        let err = parse_usda("#usda 1.0\ndef Xform \"World\" {\n    double size = = 1\n}\n").unwrap_err();
        match err {
            ParseError::Syntax { line, .. } => assert_eq!(line, 3),
            other => panic!("Expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_prim_is_rejected() {
        let err = parse_usda("#usda 1.0\ndef \"A\" {}\ndef \"A\" {}\n").unwrap_err();
        assert_eq!(err, ParseError::Document(DocumentError::DuplicatePath("/A".to_string())));
    }
}
