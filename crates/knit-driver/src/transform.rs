//! Rewrites `require` calls to address the bundle's runtime require
//!
//! The module is parsed once; a visitor collects the spans of every
//! literal `require(...)` site, and the edits are spliced into the source
//! text. Everything outside those spans is kept byte for byte.

use std::path::{Path, PathBuf};

use knit_ast::visit::{walk_expr, Visit};
use knit_ast::{Expr, Node, Span};
use tracing::warn;

use crate::error::BuildError;
use crate::resolver::{module_id, Resolver};
use crate::rules::InlineRequest;

/// Name of the require function inside emitted bundles
pub const RUNTIME_REQUIRE: &str = "__knit_require__";

/// A dependency edge discovered in a module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// Specifier as written, inline loaders included
    pub request: String,
    pub path: PathBuf,
    pub id: String,
}

#[derive(Debug, Clone)]
pub struct Transformed {
    pub source: String,
    /// Dependencies in source order; repeated requires appear once each
    pub dependencies: Vec<Dependency>,
}

struct RequireSite {
    callee: Span,
    argument: Span,
    specifier: String,
}

#[derive(Default)]
struct RequireCollector {
    sites: Vec<RequireSite>,
    skipped: Vec<Span>,
}

impl Visit for RequireCollector {
    fn visit_expr(&mut self, expr: &Node<Expr>) {
        if let Expr::Call { callee, args, .. } = &expr.value {
            if matches!(&callee.value, Expr::Ident(ident) if ident.name == "require") {
                match (expr.value.require_specifier(), args.first()) {
                    (Some(specifier), Some(argument)) => self.sites.push(RequireSite {
                        callee: callee.span,
                        argument: argument.span,
                        specifier: specifier.to_string(),
                    }),
                    _ => self.skipped.push(expr.span),
                }
            }
        }
        walk_expr(self, expr);
    }
}

/// Parse `source` (the loader output for the module at `path`), resolve
/// each literal require and rewrite it to `__knit_require__("<id>")`.
pub fn transform_module(
    source: &str,
    path: &Path,
    resolver: &Resolver,
    root: &Path,
) -> Result<Transformed, BuildError> {
    let program = knit_parser::parse_module(source).map_err(|errors| BuildError::Parse {
        path: path.to_path_buf(),
        source_text: source.to_string(),
        errors,
    })?;

    let mut collector = RequireCollector::default();
    collector.visit_program(&program);

    for span in &collector.skipped {
        warn!(
            module = %path.display(),
            line = line_of(source, span.start),
            "require with a non-literal argument left as is"
        );
    }

    let context = path.parent().unwrap_or(root);
    let mut edits = Vec::with_capacity(collector.sites.len() * 2);
    let mut dependencies: Vec<Dependency> = Vec::new();
    for site in collector.sites {
        let resource = InlineRequest::parse(&site.specifier).resource;
        let resolved = resolver.resolve(&resource, context)?;
        let id = module_id(root, &resolved);

        edits.push((site.callee, RUNTIME_REQUIRE.to_string()));
        edits.push((site.argument, quote(&id)));
        if !dependencies.iter().any(|dep| dep.id == id) {
            dependencies.push(Dependency {
                request: site.specifier,
                path: resolved,
                id,
            });
        }
    }

    Ok(Transformed {
        source: splice(source, edits),
        dependencies,
    })
}

/// Apply non-overlapping `(span, replacement)` edits to `source`
fn splice(source: &str, mut edits: Vec<(Span, String)>) -> String {
    edits.sort_by_key(|(span, _)| span.start);
    let mut out = String::with_capacity(source.len() + edits.len() * 16);
    let mut cursor = 0;
    for (span, replacement) in edits {
        out.push_str(&source[cursor..span.start]);
        out.push_str(&replacement);
        cursor = span.end;
    }
    out.push_str(&source[cursor..]);
    out
}

/// JSON string literal, which is also a valid JS string literal
pub(crate) fn quote(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}

fn line_of(source: &str, offset: usize) -> usize {
    source.get(..offset).map_or(0, |prefix| prefix.matches('\n').count()) + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    struct Fixture {
        dir: tempfile::TempDir,
    }

    impl Fixture {
        fn new(files: &[&str]) -> Self {
            let dir = tempfile::tempdir().unwrap();
            for file in files {
                let path = dir.path().join(file);
                fs::create_dir_all(path.parent().unwrap()).unwrap();
                fs::write(path, "").unwrap();
            }
            Self { dir }
        }

        fn transform(&self, source: &str) -> Result<Transformed, BuildError> {
            let resolver = Resolver::new(vec![".js".to_string(), ".json".to_string()]);
            let root = self.dir.path();
            transform_module(source, &root.join("src/index.js"), &resolver, root)
        }
    }

    #[test]
    fn test_rewrites_literal_requires() {
        let fixture = Fixture::new(&["src/title.js", "src/data.json"]);
        let out = fixture
            .transform("const title = require('./title');\nconst data = require(`./data`);\n")
            .unwrap();

        assert_eq!(
            out.source,
            "const title = __knit_require__(\"./src/title.js\");\n\
             const data = __knit_require__(\"./src/data.json\");\n"
        );
        let ids: Vec<_> = out.dependencies.iter().map(|dep| dep.id.as_str()).collect();
        assert_eq!(ids, vec!["./src/title.js", "./src/data.json"]);
    }

    #[test]
    fn test_other_code_is_preserved() {
        let fixture = Fixture::new(&["lib/util.js"]);
        let source = "// header\nfunction load(require) {\n  return require ( \"../lib/util\" ) /* x */;\n}\nconsole.log(`${a}`, /re/g);\n";
        let out = fixture.transform(source).unwrap();

        assert_eq!(
            out.source,
            "// header\nfunction load(require) {\n  return __knit_require__ ( \"./lib/util.js\" ) /* x */;\n}\nconsole.log(`${a}`, /re/g);\n"
        );
    }

    #[test]
    fn test_rewritten_source_reparses() {
        let fixture = Fixture::new(&["src/a.js", "src/b.js"]);
        let out = fixture
            .transform("module.exports = [require('./a'), () => require('./b')];")
            .unwrap();

        #[derive(Default)]
        struct Calls {
            runtime: Vec<String>,
            native: usize,
        }
        impl Visit for Calls {
            fn visit_expr(&mut self, expr: &Node<Expr>) {
                if let Expr::Call { callee, args, .. } = &expr.value {
                    if let Expr::Ident(ident) = &callee.value {
                        if ident.name == RUNTIME_REQUIRE {
                            if let Some(Expr::Literal(knit_ast::Literal::String(id))) =
                                args.first().map(|arg| &arg.value)
                            {
                                self.runtime.push(id.clone());
                            }
                        } else if ident.name == "require" {
                            self.native += 1;
                        }
                    }
                }
                walk_expr(self, expr);
            }
        }

        let program = knit_parser::parse_module(&out.source).unwrap();
        let mut calls = Calls::default();
        calls.visit_program(&program);
        assert_eq!(calls.runtime, vec!["./src/a.js", "./src/b.js"]);
        assert_eq!(calls.native, 0);
    }

    #[test]
    fn test_regex_after_control_head_and_block() {
        let fixture = Fixture::new(&["src/a.js"]);
        let source = "if (x) /re/.test(y);\n{}\n/re/.test(y);\nrequire('./a');\n";
        let out = fixture.transform(source).unwrap();

        assert_eq!(
            out.source,
            "if (x) /re/.test(y);\n{}\n/re/.test(y);\n__knit_require__(\"./src/a.js\");\n"
        );
        assert_eq!(out.dependencies.len(), 1);
    }

    #[test]
    fn test_deep_inputs_transform() {
        let fixture = Fixture::new(&["src/a.js", "src/b.js"]);
        let terms = vec!["x"; 20_000].join(" + ");
        let mut source = format!("module.exports = {} + require('./a');\n", terms);
        source.push_str("if (n === 0) f(0);");
        for arm in 1..1000 {
            source.push_str(&format!(" else if (n === {arm}) f({arm});"));
        }
        source.push_str(" else require('./b');\n");

        let out = fixture.transform(&source).unwrap();
        let ids: Vec<_> = out.dependencies.iter().map(|dep| dep.id.as_str()).collect();
        assert_eq!(ids, vec!["./src/a.js", "./src/b.js"]);
        assert!(out.source.ends_with(" else __knit_require__(\"./src/b.js\");\n"));
    }

    #[test]
    fn test_non_literal_require_is_kept() {
        let fixture = Fixture::new(&[]);
        let source = "const name = './x';\nrequire(name);\nrequire(`./${name}`);\n";
        let out = fixture.transform(source).unwrap();
        assert_eq!(out.source, source);
        assert!(out.dependencies.is_empty());
    }

    #[test]
    fn test_repeated_require_is_one_dependency() {
        let fixture = Fixture::new(&["src/a.js"]);
        let out = fixture.transform("require('./a'); require('./a.js');").unwrap();
        assert_eq!(out.dependencies.len(), 1);
        assert_eq!(
            out.source,
            "__knit_require__(\"./src/a.js\"); __knit_require__(\"./src/a.js\");"
        );
    }

    #[test]
    fn test_inline_loaders_keep_request() {
        let fixture = Fixture::new(&["src/notes.txt"]);
        let out = fixture.transform("require('!!raw-loader!./notes.txt');").unwrap();
        assert_eq!(out.dependencies[0].request, "!!raw-loader!./notes.txt");
        assert_eq!(out.dependencies[0].id, "./src/notes.txt");
    }

    #[test]
    fn test_unresolvable_require_fails() {
        let fixture = Fixture::new(&[]);
        let err = fixture.transform("require('./missing');").unwrap_err();
        assert!(matches!(err, BuildError::Resolution(e) if e.request == "./missing"));
    }

    #[test]
    fn test_syntax_error_reports_every_error() {
        let fixture = Fixture::new(&[]);
        let err = fixture.transform("const = 1;\nfunction (\n").unwrap_err();
        match err {
            BuildError::Parse { errors, source_text, .. } => {
                assert!(!errors.is_empty());
                assert_eq!(source_text, "const = 1;\nfunction (\n");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }
}
