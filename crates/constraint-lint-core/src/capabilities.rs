//! Heuristic structural queries over source text.
//!
//! Every query here is a line-oriented regex scan, not a parse. A declaration
//! split across lines (e.g. a method signature whose `{` sits on the next line)
//! is not recognised. Rules written against this index depend on exactly this
//! surface, so the patterns must stay heuristic.

use regex::Regex;
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static CLASS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bclass\s+([A-Za-z_$][\w$]*)").expect("class pattern"));

#[allow(clippy::expect_used)]
static INTERFACE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\binterface\s+([A-Za-z_$][\w$]*)").expect("interface pattern")
});

#[allow(clippy::expect_used)]
static DECORATOR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@([A-Za-z_$][\w$]*)\s*\(").expect("decorator pattern"));

#[allow(clippy::expect_used)]
static IMPORT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bimport\s+.+?\s+from\s+['"]([^'"]+)['"]"#).expect("import pattern")
});

/// Optional `async`, identifier, parameter list without nested parens, `{`.
///
/// Anything between `)` and `{` (a return type annotation) defeats the match,
/// and control-flow heads such as `if (x) {` are captured like any other name.
#[allow(clippy::expect_used)]
static METHOD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\basync\s+)?([A-Za-z_$][\w$]*)\s*\([^()]*\)\s*\{").expect("method pattern")
});

/// A name captured by a scan, with its 1-indexed position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    /// Captured identifier or module specifier.
    pub name: String,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column of the match start (1-indexed).
    pub column: usize,
}

/// Argument to a capability query: literal substring or regex.
#[derive(Debug, Clone, Copy)]
pub enum Query<'a> {
    /// Matches captured names containing this substring.
    Literal(&'a str),
    /// Matches captured names the regex finds a match in.
    Pattern(&'a Regex),
}

impl Query<'_> {
    /// Tests a single captured name.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::Literal(needle) => name.contains(needle),
            Self::Pattern(re) => re.is_match(name),
        }
    }
}

impl<'a> From<&'a str> for Query<'a> {
    fn from(value: &'a str) -> Self {
        Self::Literal(value)
    }
}

impl<'a> From<&'a String> for Query<'a> {
    fn from(value: &'a String) -> Self {
        Self::Literal(value.as_str())
    }
}

impl<'a> From<&'a Regex> for Query<'a> {
    fn from(value: &'a Regex) -> Self {
        Self::Pattern(value)
    }
}

/// Immutable per-file index backing the capability queries.
///
/// Built once per file and shared by every rule evaluated against it.
#[derive(Debug, Clone, Default)]
pub struct CapabilityIndex {
    classes: Vec<Capture>,
    methods: Vec<Capture>,
    imports: Vec<Capture>,
    decorators: Vec<Capture>,
    interfaces: Vec<Capture>,
}

impl CapabilityIndex {
    /// Scans `content` once, line by line, with each extractor.
    #[must_use]
    pub fn build(content: &str) -> Self {
        let mut index = Self::default();

        for (i, line) in content.lines().enumerate() {
            let line_no = i + 1;
            scan(&CLASS_PATTERN, line, line_no, &mut index.classes);
            scan(&INTERFACE_PATTERN, line, line_no, &mut index.interfaces);
            scan(&DECORATOR_PATTERN, line, line_no, &mut index.decorators);
            scan(&IMPORT_PATTERN, line, line_no, &mut index.imports);
            scan(&METHOD_PATTERN, line, line_no, &mut index.methods);
        }

        index
    }

    /// Does the file declare a class matching `query`?
    #[must_use]
    pub fn has_class<'q>(&self, query: impl Into<Query<'q>>) -> bool {
        any_match(&self.classes, &query.into())
    }

    /// Does the file declare a single-line method matching `query`?
    #[must_use]
    pub fn has_method<'q>(&self, query: impl Into<Query<'q>>) -> bool {
        any_match(&self.methods, &query.into())
    }

    /// Does the file import a module whose specifier matches `query`?
    #[must_use]
    pub fn has_import<'q>(&self, query: impl Into<Query<'q>>) -> bool {
        any_match(&self.imports, &query.into())
    }

    /// Does the file use a decorator call `@Name(` matching `query`?
    #[must_use]
    pub fn has_decorator<'q>(&self, query: impl Into<Query<'q>>) -> bool {
        any_match(&self.decorators, &query.into())
    }

    /// Does the file declare an interface matching `query`?
    #[must_use]
    pub fn has_interface<'q>(&self, query: impl Into<Query<'q>>) -> bool {
        any_match(&self.interfaces, &query.into())
    }

    /// Captured class names, in source order.
    #[must_use]
    pub fn classes(&self) -> Vec<&str> {
        names(&self.classes)
    }

    /// Captured method names, in source order.
    #[must_use]
    pub fn methods(&self) -> Vec<&str> {
        names(&self.methods)
    }

    /// Captured import module specifiers, in source order.
    #[must_use]
    pub fn imports(&self) -> Vec<&str> {
        names(&self.imports)
    }

    /// Captured decorator names, in source order.
    #[must_use]
    pub fn decorators(&self) -> Vec<&str> {
        names(&self.decorators)
    }

    /// Captured interface names, in source order.
    #[must_use]
    pub fn interfaces(&self) -> Vec<&str> {
        names(&self.interfaces)
    }

    /// Import captures with positions, for rules that report locations.
    #[must_use]
    pub fn import_captures(&self) -> &[Capture] {
        &self.imports
    }

    /// Class captures with positions.
    #[must_use]
    pub fn class_captures(&self) -> &[Capture] {
        &self.classes
    }
}

fn scan(pattern: &Regex, line: &str, line_no: usize, out: &mut Vec<Capture>) {
    for caps in pattern.captures_iter(line) {
        if let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) {
            out.push(Capture {
                name: name.as_str().to_string(),
                line: line_no,
                column: whole.start() + 1,
            });
        }
    }
}

fn any_match(captures: &[Capture], query: &Query<'_>) -> bool {
    captures.iter().any(|c| query.matches(&c.name))
}

fn names(captures: &[Capture]) -> Vec<&str> {
    captures.iter().map(|c| c.name.as_str()).collect()
}
