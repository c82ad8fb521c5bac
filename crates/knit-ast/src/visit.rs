//! Read-only depth-first traversal.
//!
//! Implement the `visit_*` hooks you care about and call the matching
//! `walk_*` function from inside them to keep descending.

use super::*;

pub trait Visit {
    fn visit_program(&mut self, program: &Program) {
        walk_program(self, program);
    }

    fn visit_module_item(&mut self, item: &Node<ModuleItem>) {
        walk_module_item(self, item);
    }

    fn visit_stmt(&mut self, stmt: &Node<Stmt>) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Node<Expr>) {
        walk_expr(self, expr);
    }

    /// Inner node of a left-nested binary chain such as `a + b + c`.
    ///
    /// `walk_expr` reports these here instead of through `visit_expr` and
    /// walks their operands itself, so long chains don't recurse.
    fn visit_binary(&mut self, expr: &Node<Expr>) {
        let _ = expr;
    }

    fn visit_pattern(&mut self, pattern: &Node<Pattern>) {
        walk_pattern(self, pattern);
    }

    fn visit_function(&mut self, function: &Function) {
        walk_function(self, function);
    }

    fn visit_class(&mut self, class: &Class) {
        walk_class(self, class);
    }
}

pub fn walk_program<V: Visit + ?Sized>(v: &mut V, program: &Program) {
    for item in &program.items {
        v.visit_module_item(item);
    }
}

pub fn walk_module_item<V: Visit + ?Sized>(v: &mut V, item: &Node<ModuleItem>) {
    match &item.value {
        ModuleItem::Import(_) => {}
        ModuleItem::Export(export) => match export {
            ExportDecl::Named { .. } | ExportDecl::All { .. } => {}
            ExportDecl::Default(expr) => v.visit_expr(expr),
            ExportDecl::DefaultDecl(decl) => walk_decl(v, &decl.value),
            ExportDecl::Decl(stmt) => v.visit_stmt(stmt),
        },
        ModuleItem::Stmt(stmt) => v.visit_stmt(stmt),
    }
}

fn walk_decl<V: Visit + ?Sized>(v: &mut V, decl: &Decl) {
    match decl {
        Decl::Function(function) => v.visit_function(function),
        Decl::Class(class) => v.visit_class(class),
    }
}

fn walk_block<V: Visit + ?Sized>(v: &mut V, block: &BlockStmt) {
    for stmt in &block.stmts {
        v.visit_stmt(stmt);
    }
}

fn walk_var_decl<V: Visit + ?Sized>(v: &mut V, decl: &VarDecl) {
    for declarator in &decl.declarations {
        v.visit_pattern(&declarator.pattern);
        if let Some(init) = &declarator.init {
            v.visit_expr(init);
        }
    }
}

fn walk_for_left<V: Visit + ?Sized>(v: &mut V, left: &ForInLeft) {
    match left {
        ForInLeft::VarDecl(decl) => walk_var_decl(v, decl),
        ForInLeft::Pattern(pattern) => v.visit_pattern(pattern),
    }
}

pub fn walk_stmt<V: Visit + ?Sized>(v: &mut V, stmt: &Node<Stmt>) {
    match &stmt.value {
        Stmt::Expr(expr) | Stmt::Throw(expr) => v.visit_expr(expr),
        Stmt::VarDecl(decl) => walk_var_decl(v, decl),
        Stmt::Decl(decl) => walk_decl(v, decl),
        Stmt::Return(expr) => {
            if let Some(expr) = expr {
                v.visit_expr(expr);
            }
        }
        Stmt::If { condition, then_stmt, else_stmt } => {
            v.visit_expr(condition);
            v.visit_stmt(then_stmt);
            if let Some(else_stmt) = else_stmt {
                v.visit_stmt(else_stmt);
            }
        }
        Stmt::For { init, condition, update, body } => {
            match init {
                Some(ForInit::VarDecl(decl)) => walk_var_decl(v, decl),
                Some(ForInit::Expr(expr)) => v.visit_expr(expr),
                None => {}
            }
            if let Some(condition) = condition {
                v.visit_expr(condition);
            }
            if let Some(update) = update {
                v.visit_expr(update);
            }
            v.visit_stmt(body);
        }
        Stmt::ForIn { left, right, body } | Stmt::ForOf { left, right, body, .. } => {
            walk_for_left(v, left);
            v.visit_expr(right);
            v.visit_stmt(body);
        }
        Stmt::While { condition, body } | Stmt::DoWhile { body, condition } => {
            v.visit_expr(condition);
            v.visit_stmt(body);
        }
        Stmt::Block(block) => walk_block(v, block),
        Stmt::Try { block, catch, finally } => {
            walk_block(v, &block.value);
            if let Some(catch) = catch {
                if let Some(param) = &catch.param {
                    v.visit_pattern(param);
                }
                walk_block(v, &catch.body.value);
            }
            if let Some(finally) = finally {
                walk_block(v, &finally.value);
            }
        }
        Stmt::Switch { discriminant, cases } => {
            v.visit_expr(discriminant);
            for case in cases {
                if let Some(test) = &case.test {
                    v.visit_expr(test);
                }
                for stmt in &case.consequent {
                    v.visit_stmt(stmt);
                }
            }
        }
        Stmt::Labeled { stmt, .. } => v.visit_stmt(stmt),
        Stmt::With { object, body } => {
            v.visit_expr(object);
            v.visit_stmt(body);
        }
        Stmt::Break(_) | Stmt::Continue(_) | Stmt::Empty | Stmt::Debugger => {}
    }
}

fn walk_property_name<V: Visit + ?Sized>(v: &mut V, key: &PropertyName) {
    if let PropertyName::Computed(expr) = key {
        v.visit_expr(expr);
    }
}

fn walk_template<V: Visit + ?Sized>(v: &mut V, template: &Template) {
    for expr in &template.exprs {
        v.visit_expr(expr);
    }
}

pub fn walk_expr<V: Visit + ?Sized>(v: &mut V, expr: &Node<Expr>) {
    match &expr.value {
        Expr::Literal(_)
        | Expr::Ident(_)
        | Expr::PrivateName(_)
        | Expr::Import
        | Expr::MetaProperty { .. }
        | Expr::This
        | Expr::Super => {}
        Expr::Binary { left, right, .. } => {
            let mut rights = vec![right];
            let mut leftmost = left;
            while let Expr::Binary { left, right, .. } = &leftmost.value {
                v.visit_binary(leftmost);
                rights.push(right);
                leftmost = left;
            }
            v.visit_expr(leftmost);
            for right in rights.into_iter().rev() {
                v.visit_expr(right);
            }
        }
        Expr::Assignment { target, value, .. } => {
            v.visit_expr(target);
            v.visit_expr(value);
        }
        Expr::Unary { expr, .. }
        | Expr::Await(expr)
        | Expr::Paren(expr)
        | Expr::Spread(expr) => v.visit_expr(expr),
        Expr::Call { callee, args, .. } => {
            v.visit_expr(callee);
            for arg in args {
                v.visit_expr(arg);
            }
        }
        Expr::New { callee, args } => {
            v.visit_expr(callee);
            for arg in args.iter().flatten() {
                v.visit_expr(arg);
            }
        }
        Expr::Member { object, property, .. } => {
            v.visit_expr(object);
            if let MemberProp::Computed(index) = property {
                v.visit_expr(index);
            }
        }
        Expr::Array(elements) => {
            for element in elements.iter().flatten() {
                v.visit_expr(element);
            }
        }
        Expr::Object(properties) => {
            for property in properties {
                match property {
                    ObjectProperty::Property { key, value, shorthand } => {
                        if !shorthand {
                            walk_property_name(v, key);
                        }
                        v.visit_expr(value);
                    }
                    ObjectProperty::Method { key, function, .. } => {
                        walk_property_name(v, key);
                        v.visit_function(function);
                    }
                    ObjectProperty::Spread(expr) => v.visit_expr(expr),
                }
            }
        }
        Expr::Arrow { params, body, .. } => {
            for param in params {
                v.visit_pattern(&param.pattern);
            }
            match body {
                ArrowBody::Expr(expr) => v.visit_expr(expr),
                ArrowBody::Block(block) => walk_block(v, &block.value),
            }
        }
        Expr::Function(function) => v.visit_function(function),
        Expr::Class(class) => v.visit_class(class),
        Expr::Ternary { condition, then_expr, else_expr } => {
            v.visit_expr(condition);
            v.visit_expr(then_expr);
            v.visit_expr(else_expr);
        }
        Expr::Template(template) => walk_template(v, template),
        Expr::TaggedTemplate { tag, template } => {
            v.visit_expr(tag);
            walk_template(v, template);
        }
        Expr::Yield { argument, .. } => {
            if let Some(argument) = argument {
                v.visit_expr(argument);
            }
        }
        Expr::Sequence(exprs) => {
            for expr in exprs {
                v.visit_expr(expr);
            }
        }
    }
}

pub fn walk_pattern<V: Visit + ?Sized>(v: &mut V, pattern: &Node<Pattern>) {
    match &pattern.value {
        Pattern::Ident(_) => {}
        Pattern::Array { elements, rest } => {
            for element in elements.iter().flatten() {
                v.visit_pattern(element);
            }
            if let Some(rest) = rest {
                v.visit_pattern(rest);
            }
        }
        Pattern::Object { properties, rest } => {
            for property in properties {
                walk_property_name(v, &property.key);
                v.visit_pattern(&property.value);
            }
            if let Some(rest) = rest {
                v.visit_pattern(rest);
            }
        }
        Pattern::Assignment { pattern, default } => {
            v.visit_pattern(pattern);
            v.visit_expr(default);
        }
        Pattern::Expr(expr) => v.visit_expr(expr),
    }
}

pub fn walk_function<V: Visit + ?Sized>(v: &mut V, function: &Function) {
    for param in &function.params {
        v.visit_pattern(&param.pattern);
    }
    walk_block(v, &function.body.value);
}

pub fn walk_class<V: Visit + ?Sized>(v: &mut V, class: &Class) {
    if let Some(super_class) = &class.super_class {
        v.visit_expr(super_class);
    }
    for member in &class.members {
        match member {
            ClassMember::Method { key, function, .. } => {
                walk_property_name(v, key);
                v.visit_function(function);
            }
            ClassMember::Property { key, init, .. } => {
                walk_property_name(v, key);
                if let Some(init) = init {
                    v.visit_expr(init);
                }
            }
            ClassMember::StaticBlock(block) => walk_block(v, &block.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CallCounter {
        calls: usize,
    }

    impl Visit for CallCounter {
        fn visit_expr(&mut self, expr: &Node<Expr>) {
            if matches!(expr.value, Expr::Call { .. }) {
                self.calls += 1;
            }
            walk_expr(self, expr);
        }
    }

    fn ident(name: &str) -> Node<Expr> {
        Node::new(Expr::Ident(Ident::new(name)), Span::default())
    }

    fn call(name: &str) -> Node<Expr> {
        Node::new(
            Expr::Call { callee: Box::new(ident(name)), args: vec![], optional: false },
            Span::default(),
        )
    }

    fn binary(left: Node<Expr>, right: Node<Expr>) -> Node<Expr> {
        Node::new(
            Expr::Binary { left: Box::new(left), op: BinaryOp::Add, right: Box::new(right) },
            Span::default(),
        )
    }

    #[derive(Default)]
    struct OrderRecorder {
        calls: Vec<String>,
        binaries: usize,
    }

    impl Visit for OrderRecorder {
        fn visit_expr(&mut self, expr: &Node<Expr>) {
            if let Expr::Call { callee, .. } = &expr.value {
                if let Expr::Ident(ident) = &callee.value {
                    self.calls.push(ident.name.clone());
                }
            }
            walk_expr(self, expr);
        }

        fn visit_binary(&mut self, _expr: &Node<Expr>) {
            self.binaries += 1;
        }
    }

    #[test]
    fn test_binary_chain_operands_in_source_order() {
        // (a() + (b() + c())) + d()
        let chain = binary(binary(call("a"), binary(call("b"), call("c"))), call("d"));

        let mut recorder = OrderRecorder::default();
        recorder.visit_expr(&chain);
        assert_eq!(recorder.calls, vec!["a", "b", "c", "d"]);
        assert_eq!(recorder.binaries, 1);
    }

    #[test]
    fn test_long_binary_chain_walks_and_drops() {
        let mut chain = call("f0");
        for index in 1..50_000 {
            chain = binary(chain, call(&format!("f{}", index)));
        }

        let mut counter = CallCounter { calls: 0 };
        counter.visit_expr(&chain);
        assert_eq!(counter.calls, 50_000);
        drop(chain);
    }

    #[test]
    fn test_walk_reaches_nested_calls() {
        let inner = Node::new(
            Expr::Call { callee: Box::new(ident("g")), args: vec![], optional: false },
            Span::default(),
        );
        let outer = Node::new(
            Expr::Call { callee: Box::new(ident("f")), args: vec![inner], optional: false },
            Span::default(),
        );
        let program = Program {
            items: vec![Node::new(
                ModuleItem::Stmt(Node::new(Stmt::Expr(outer), Span::default())),
                Span::default(),
            )],
            span: Span::default(),
        };

        let mut counter = CallCounter { calls: 0 };
        counter.visit_program(&program);
        assert_eq!(counter.calls, 2);
    }
}
