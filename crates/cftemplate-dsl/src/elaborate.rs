//! Elaboration of parsed statements into a [`Template`].
//!
//! Each top-level statement declares a template member. Statements inside a
//! `do ... end` block set attributes on the node being declared; a statement
//! the node does not understand is handed to the template once, so a
//! `parameter` can be declared from inside a resource block. Problems are
//! reported as located issues and elaboration moves on to the next statement.

use std::collections::HashSet;

use log::{debug, trace};

use cftemplate_core::{
    Template,
    diagnostic::{ErrorCode, Issue, IssueCollector},
    intrinsic::{self, Call},
    lower::lower,
    node::{GenericResource, Output, Parameter, Resource, StackReference, WaitCondition},
    value::{Interval, Json, Mapping, Value},
};

use crate::{
    parser_types::{Expr, Statement},
    span::{LineIndex, Span, Spanned},
};

type Result<T> = std::result::Result<T, Issue>;

/// Signature of the per-node attribute handlers.
///
/// `Ok(false)` means the statement is not an attribute of the node.
type AttributeFn<'a, N> = fn(&mut Elaborator<'a>, &mut N, &Statement<'_>) -> Result<bool>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Section {
    Parameter,
    Resource,
    Output,
}

impl Section {
    fn label(self) -> &'static str {
        match self {
            Section::Parameter => "parameter",
            Section::Resource => "resource",
            Section::Output => "output",
        }
    }
}

/// Short description of an expression's shape for diagnostics
fn describe(expr: &Expr<'_>) -> &'static str {
    match expr {
        Expr::Nil => "nil",
        Expr::Bool(_) => "boolean",
        Expr::Int(_) => "integer",
        Expr::Float(_) => "float",
        Expr::String(_) => "string",
        Expr::Symbol(_) => "symbol",
        Expr::Range(_, _) => "range",
        Expr::Array(_) => "array",
        Expr::Hash(_) => "hash",
        Expr::Call { .. } => "function call",
    }
}

/// Pick the typed resource for well-known CloudFormation types
fn resource_for_type(resource_type: String) -> Resource {
    match resource_type.as_str() {
        "AWS::CloudFormation::WaitConditionHandle" => Resource::wait_condition_handle(),
        "AWS::CloudFormation::WaitCondition" => Resource::wait_condition(),
        "AWS::CloudFormation::Stack" => Resource::stack(),
        _ => Resource::generic(resource_type),
    }
}

pub(crate) struct Elaborator<'a> {
    source_name: &'a str,
    index: LineIndex,
    issues: IssueCollector,
    template: Template,
    defined: HashSet<(Section, String)>,
}

impl<'a> Elaborator<'a> {
    pub(crate) fn new(source: &str, source_name: &'a str) -> Self {
        Self {
            source_name,
            index: LineIndex::new(source),
            issues: IssueCollector::new(),
            template: Template::new(),
            defined: HashSet::new(),
        }
    }

    /// Elaborate every top-level statement.
    pub(crate) fn run(mut self, statements: &[Statement<'_>]) -> (Template, IssueCollector) {
        for statement in statements {
            match self.template_statement(statement) {
                Ok(true) => {}
                Ok(false) => {
                    let issue = self.undefined(statement, None);
                    self.issues.emit(issue);
                }
                Err(issue) => self.issues.emit(issue),
            }
        }

        debug!(
            source = self.source_name,
            issues = self.issues.issues().len();
            "Elaborated template"
        );
        (self.template, self.issues)
    }

    fn locate(&self, span: Span) -> String {
        let (line, column) = self.index.line_col(span.start());
        format!("{}:{line}:{column}", self.source_name)
    }

    fn error(&self, code: ErrorCode, message: impl Into<String>, span: Span) -> Issue {
        Issue::error(message)
            .with_code(code)
            .with_location(self.locate(span))
    }

    fn undefined(&self, statement: &Statement<'_>, block: Option<String>) -> Issue {
        let name = statement.name.inner();
        let message = match block {
            Some(kind) => format!("undefined statement `{name}` in {kind} block"),
            None => format!("undefined statement `{name}`"),
        };
        self.error(ErrorCode::E200, message, statement.name.span())
    }

    fn check_arity(
        &self,
        name: &Spanned<&str>,
        count: usize,
        min: usize,
        max: usize,
    ) -> Result<()> {
        if (min..=max).contains(&count) {
            return Ok(());
        }
        let expected = if min == max {
            min.to_string()
        } else if max == usize::MAX {
            format!("at least {min}")
        } else {
            format!("{min} to {max}")
        };
        Err(self.error(
            ErrorCode::E201,
            format!(
                "`{}` expects {expected} argument(s), got {count}",
                name.inner()
            ),
            name.span(),
        ))
    }

    fn arity(&self, statement: &Statement<'_>, min: usize, max: usize) -> Result<()> {
        self.check_arity(&statement.name, statement.arguments.len(), min, max)
    }

    fn no_block(&self, statement: &Statement<'_>) -> Result<()> {
        match statement.block {
            Some(_) => Err(self.error(
                ErrorCode::E201,
                format!("`{}` does not take a block", statement.name.inner()),
                statement.name.span(),
            )),
            None => Ok(()),
        }
    }

    /// The only argument of a block-less attribute statement
    fn single(&mut self, statement: &Statement<'_>) -> Result<Value> {
        self.no_block(statement)?;
        self.arity(statement, 1, 1)?;
        self.value(&statement.arguments[0])
    }

    /// A string or symbol argument
    fn text(&self, argument: &Spanned<Expr<'_>>, what: &str) -> Result<String> {
        match argument.inner() {
            Expr::String(s) => Ok(s.clone()),
            Expr::Symbol(s) => Ok(s.to_string()),
            other => Err(self.error(
                ErrorCode::E201,
                format!("{what} must be a string or symbol, found {}", describe(other)),
                argument.span(),
            )),
        }
    }

    fn hash_argument(&mut self, argument: &Spanned<Expr<'_>>, what: &str) -> Result<Mapping> {
        match argument.inner() {
            Expr::Hash(pairs) => self.mapping(pairs),
            other => Err(self.error(
                ErrorCode::E201,
                format!("{what} must be a hash, found {}", describe(other)),
                argument.span(),
            )),
        }
    }

    fn values(&mut self, arguments: &[Spanned<Expr<'_>>]) -> Result<Vec<Value>> {
        arguments.iter().map(|argument| self.value(argument)).collect()
    }

    fn value(&mut self, expr: &Spanned<Expr<'_>>) -> Result<Value> {
        let value = match expr.inner() {
            Expr::Nil => Value::Null,
            Expr::Bool(b) => Value::Bool(*b),
            Expr::Int(n) => Value::Int(*n),
            Expr::Float(n) => Value::Float(*n),
            Expr::String(s) => Value::String(s.clone()),
            Expr::Symbol(s) => Value::String(s.to_string()),
            Expr::Range(start, end) => Value::Interval(Interval::new(*start, *end)),
            Expr::Array(items) => Value::Sequence(self.values(items)?),
            Expr::Hash(pairs) => Value::Mapping(self.mapping(pairs)?),
            Expr::Call { name, arguments } => Value::Call(self.call(name, arguments)?),
        };
        Ok(value)
    }

    /// Hash keys are strings or symbols; integer keys are written out.
    fn mapping(&mut self, pairs: &[(Spanned<Expr<'_>>, Spanned<Expr<'_>>)]) -> Result<Mapping> {
        let mut mapping = Mapping::new();
        for (key, value) in pairs {
            let key = match key.inner() {
                Expr::Int(n) => n.to_string(),
                _ => self.text(key, "hash key")?,
            };
            let value = self.value(value)?;
            mapping.insert(key, value);
        }
        Ok(mapping)
    }

    /// Lower an intrinsic argument, locating lowering issues at `span`.
    fn lower_at(&mut self, value: &Value, span: Span) -> Json {
        let mut scratch = IssueCollector::new();
        let json = lower(value, &mut scratch).unwrap_or(Json::Null);
        let location = self.locate(span);
        self.issues.extend_located(scratch.into_issues(), &location);
        json
    }

    fn json(&mut self, argument: &Spanned<Expr<'_>>) -> Result<Json> {
        let value = self.value(argument)?;
        Ok(self.lower_at(&value, argument.span()))
    }

    /// Variadic intrinsic items.
    ///
    /// `join(",", ["a", "b"])` and `join(",", "a", "b")` build the same call;
    /// the builders do the flattening.
    fn json_items(&mut self, arguments: &[Spanned<Expr<'_>>]) -> Result<Vec<Json>> {
        arguments.iter().map(|argument| self.json(argument)).collect()
    }

    fn call(&mut self, name: &Spanned<&str>, arguments: &[Spanned<Expr<'_>>]) -> Result<Call> {
        let count = arguments.len();
        let call = match *name.inner() {
            "ref" => {
                self.check_arity(name, count, 1, 1)?;
                intrinsic::ref_(self.text(&arguments[0], "`ref` target")?)
            }
            "get_att" => {
                self.check_arity(name, count, 2, 2)?;
                let resource = self.json(&arguments[0])?;
                let attribute = self.json(&arguments[1])?;
                intrinsic::get_att(resource, attribute)
            }
            "join" => {
                self.check_arity(name, count, 1, usize::MAX)?;
                let separator = self.json(&arguments[0])?;
                let items = self.json_items(&arguments[1..])?;
                intrinsic::join(separator, items)
            }
            "select" => {
                self.check_arity(name, count, 2, usize::MAX)?;
                let index = self.json(&arguments[0])?;
                let items = self.json_items(&arguments[1..])?;
                intrinsic::select(index, items)
            }
            "get_azs" => {
                self.check_arity(name, count, 0, 1)?;
                match arguments.first() {
                    Some(region) => intrinsic::get_azs_in(self.json(region)?),
                    None => intrinsic::get_azs(),
                }
            }
            "find_in_map" => {
                self.check_arity(name, count, 3, 3)?;
                let map = self.json(&arguments[0])?;
                let key = self.json(&arguments[1])?;
                let value = self.json(&arguments[2])?;
                intrinsic::find_in_map(map, key, value)
            }
            "base64" => {
                self.check_arity(name, count, 1, 1)?;
                intrinsic::base64(self.json(&arguments[0])?)
            }
            other => {
                return Err(self.error(
                    ErrorCode::E203,
                    format!("undefined function `{other}`"),
                    name.span(),
                ));
            }
        };
        trace!(function = call.function().tag(); "Built intrinsic call");
        Ok(call)
    }

    fn check_duplicate(&mut self, section: Section, name: &str, statement: &Statement<'_>) {
        if self.defined.insert((section, name.to_string())) {
            return;
        }
        let issue = Issue::warn(format!(
            "{} `{name}` is defined more than once; the later definition replaces the earlier one",
            section.label()
        ))
        .with_code(ErrorCode::E202)
        .with_location(self.locate(statement.name.span()));
        self.issues.emit(issue);
    }

    /// Run the statements of `statement`'s block against `node`.
    fn elaborate_block<N>(
        &mut self,
        node: &mut N,
        kind: String,
        statement: &Statement<'_>,
        attribute: AttributeFn<'a, N>,
    ) {
        let Some(block) = &statement.block else {
            return;
        };

        for inner in block {
            let handled = match attribute(self, node, inner) {
                Ok(false) => {
                    self.check_template_attribute(inner, &kind);
                    self.template_statement(inner)
                }
                other => other,
            };
            match handled {
                Ok(true) => {}
                Ok(false) => {
                    let issue = self.undefined(inner, Some(kind.clone()));
                    self.issues.emit(issue);
                }
                Err(issue) => self.issues.emit(issue),
            }
        }
    }

    /// A block statement that falls through to the template and replaces an
    /// attribute set earlier.
    fn check_template_attribute(&mut self, statement: &Statement<'_>, kind: &str) {
        if *statement.name.inner() != "description" || self.template.description().is_absent() {
            return;
        }
        let issue = Issue::warn(format!(
            "`description` in {kind} block replaces the template description"
        ))
        .with_code(ErrorCode::E205)
        .with_location(self.locate(statement.name.span()));
        self.issues.emit(issue);
    }

    /// Handle a statement that declares a template member.
    fn template_statement(&mut self, statement: &Statement<'_>) -> Result<bool> {
        match *statement.name.inner() {
            "description" => {
                let description = self.single(statement)?;
                self.template.set_description(description);
            }
            "mapping" => {
                self.no_block(statement)?;
                self.arity(statement, 2, 2)?;
                let name = self.text(&statement.arguments[0], "mapping name")?;
                let entries = self.hash_argument(&statement.arguments[1], "mapping entries")?;
                debug!(name = name.as_str(); "Defined mapping");
                self.template.add_mapping(name, entries);
            }
            "parameter" => {
                self.arity(statement, 1, 2)?;
                let parameter = match statement.arguments.get(1) {
                    Some(kind) => self.parameter_type(kind)?,
                    None => Parameter::string(),
                };
                self.define_parameter(statement, parameter)?;
            }
            "string_parameter" => {
                self.arity(statement, 1, 1)?;
                self.define_parameter(statement, Parameter::string())?;
            }
            "number_parameter" => {
                self.arity(statement, 1, 1)?;
                self.define_parameter(statement, Parameter::number())?;
            }
            "list_parameter" => {
                self.arity(statement, 1, 1)?;
                self.define_parameter(statement, Parameter::list())?;
            }
            "resource" => {
                self.arity(statement, 1, 2)?;
                let resource = match statement.arguments.get(1) {
                    Some(resource_type) => {
                        resource_for_type(self.text(resource_type, "resource type")?)
                    }
                    None => Resource::untyped(),
                };
                self.define_resource(statement, resource)?;
            }
            "wait_condition_handle" => {
                self.arity(statement, 1, 1)?;
                self.define_resource(statement, Resource::wait_condition_handle())?;
            }
            "wait_condition" => {
                self.arity(statement, 1, 1)?;
                self.define_resource(statement, Resource::wait_condition())?;
            }
            "stack" => {
                self.arity(statement, 1, 1)?;
                self.define_resource(statement, Resource::stack())?;
            }
            "output" => {
                self.arity(statement, 1, 2)?;
                let mut output = Output::new();
                if let Some(value) = statement.arguments.get(1) {
                    output.set_value(self.value(value)?);
                }
                self.define_output(statement, output)?;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn parameter_type(&self, argument: &Spanned<Expr<'_>>) -> Result<Parameter> {
        let name = self.text(argument, "parameter type")?;
        match name.to_ascii_lowercase().as_str() {
            "string" => Ok(Parameter::string()),
            "number" => Ok(Parameter::number()),
            "list" | "commadelimitedlist" => Ok(Parameter::list()),
            _ => Err(self.error(
                ErrorCode::E204,
                format!("unknown parameter type `{name}`, expected :string, :number or :list"),
                argument.span(),
            )),
        }
    }

    fn define_parameter(
        &mut self,
        statement: &Statement<'_>,
        mut parameter: Parameter,
    ) -> Result<()> {
        let name = self.text(&statement.arguments[0], "parameter name")?;
        let kind = parameter.kind().to_string();
        self.elaborate_block(&mut parameter, kind, statement, Self::parameter_attribute);
        self.check_duplicate(Section::Parameter, &name, statement);
        debug!(name = name.as_str(), kind:% = parameter.kind(); "Defined parameter");
        self.template.add_parameter(name, parameter);
        Ok(())
    }

    fn define_resource(&mut self, statement: &Statement<'_>, mut resource: Resource) -> Result<()> {
        let name = self.text(&statement.arguments[0], "resource name")?;
        let kind = resource.kind().to_string();
        self.elaborate_block(&mut resource, kind, statement, Self::resource_attribute);
        self.check_duplicate(Section::Resource, &name, statement);
        debug!(name = name.as_str(), kind:% = resource.kind(); "Defined resource");
        self.template.add_resource(name, resource);
        Ok(())
    }

    fn define_output(&mut self, statement: &Statement<'_>, mut output: Output) -> Result<()> {
        let name = self.text(&statement.arguments[0], "output name")?;
        self.elaborate_block(&mut output, "output".to_string(), statement, Self::output_attribute);
        self.check_duplicate(Section::Output, &name, statement);
        debug!(name = name.as_str(); "Defined output");
        self.template.add_output(name, output);
        Ok(())
    }

    fn parameter_attribute(
        &mut self,
        parameter: &mut Parameter,
        statement: &Statement<'_>,
    ) -> Result<bool> {
        match *statement.name.inner() {
            "description" => {
                parameter.set_description(self.single(statement)?);
            }
            "constraint_description" => {
                parameter.set_constraint_description(self.single(statement)?);
            }
            "no_echo" => {
                self.no_block(statement)?;
                self.arity(statement, 0, 1)?;
                let no_echo = match statement.arguments.first().map(|a| (a.inner(), a.span())) {
                    None => true,
                    Some((Expr::Bool(b), _)) => *b,
                    Some((other, span)) => {
                        return Err(self.error(
                            ErrorCode::E201,
                            format!("`no_echo` expects true or false, found {}", describe(other)),
                            span,
                        ));
                    }
                };
                parameter.set_no_echo(no_echo);
            }
            "default" => {
                parameter.set_default(self.single(statement)?);
            }
            "allowed_values" => {
                self.no_block(statement)?;
                self.arity(statement, 1, usize::MAX)?;
                let values = self.values(&statement.arguments)?;
                if let Some(string) = parameter.as_string_mut() {
                    string.set_allowed_values(values);
                } else if let Some(number) = parameter.as_number_mut() {
                    number.set_allowed_values(values);
                } else {
                    return Ok(false);
                }
            }
            "length" => {
                let Some(string) = parameter.as_string_mut() else {
                    return Ok(false);
                };
                string.set_length(self.single(statement)?);
            }
            "allowed_pattern" | "pattern" => {
                let Some(string) = parameter.as_string_mut() else {
                    return Ok(false);
                };
                string.set_allowed_pattern(self.single(statement)?);
            }
            "min_value" | "min" => {
                let Some(number) = parameter.as_number_mut() else {
                    return Ok(false);
                };
                number.set_min_value(self.single(statement)?);
            }
            "max_value" | "max" => {
                let Some(number) = parameter.as_number_mut() else {
                    return Ok(false);
                };
                number.set_max_value(self.single(statement)?);
            }
            "range" => {
                let Some(number) = parameter.as_number_mut() else {
                    return Ok(false);
                };
                match self.single(statement)? {
                    Value::Interval(interval) => number.set_range(Some(interval)),
                    Value::Null => number.set_range(None),
                    other => {
                        return Err(self.error(
                            ErrorCode::E201,
                            format!(
                                "`range` expects a range such as 1..10, found {}",
                                other.shape()
                            ),
                            statement.arguments[0].span(),
                        ));
                    }
                };
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn resource_attribute(
        &mut self,
        resource: &mut Resource,
        statement: &Statement<'_>,
    ) -> Result<bool> {
        match *statement.name.inner() {
            "metadata" => {
                self.no_block(statement)?;
                self.arity(statement, 1, 2)?;
                if let [key, value] = statement.arguments.as_slice() {
                    let key = self.text(key, "metadata key")?;
                    let value = self.value(value)?;
                    resource.set_metadata_entry(key, value);
                } else {
                    let metadata = self.hash_argument(&statement.arguments[0], "`metadata`")?;
                    resource.set_metadata(metadata);
                }
            }
            "depends_on" => {
                self.no_block(statement)?;
                self.arity(statement, 1, usize::MAX)?;
                let names = self.values(&statement.arguments)?;
                resource.set_depends_on(names);
            }
            "deletion_policy" => {
                let policy = self.single(statement)?;
                let Some(policy) = policy.as_str() else {
                    return Err(self.error(
                        ErrorCode::E201,
                        format!(
                            "`deletion_policy` expects a string or symbol, found {}",
                            policy.shape()
                        ),
                        statement.arguments[0].span(),
                    ));
                };
                resource.set_deletion_policy(policy);
            }
            _ => {
                if let Some(wait) = resource.as_wait_condition_mut() {
                    return self.wait_condition_attribute(wait, statement);
                }
                if let Some(stack) = resource.as_stack_mut() {
                    return self.stack_attribute(stack, statement);
                }
                if let Some(generic) = resource.as_generic_mut() {
                    return self.generic_attribute(generic, statement);
                }
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn generic_attribute(
        &mut self,
        generic: &mut GenericResource,
        statement: &Statement<'_>,
    ) -> Result<bool> {
        match *statement.name.inner() {
            "type" => {
                self.no_block(statement)?;
                self.arity(statement, 1, 1)?;
                generic.set_resource_type(self.text(&statement.arguments[0], "resource type")?);
            }
            "properties" => {
                self.no_block(statement)?;
                self.arity(statement, 1, 1)?;
                let properties = self.hash_argument(&statement.arguments[0], "`properties`")?;
                generic.set_properties(properties);
            }
            "property" => {
                self.no_block(statement)?;
                self.arity(statement, 2, 2)?;
                let name = self.text(&statement.arguments[0], "property name")?;
                let value = self.value(&statement.arguments[1])?;
                generic.set_property(name, value);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn wait_condition_attribute(
        &mut self,
        wait: &mut WaitCondition,
        statement: &Statement<'_>,
    ) -> Result<bool> {
        match *statement.name.inner() {
            "timeout" => {
                wait.set_timeout(self.single(statement)?);
            }
            "count" => {
                wait.set_count(self.single(statement)?);
            }
            "handle" => {
                wait.set_handle(self.single(statement)?);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn stack_attribute(
        &mut self,
        stack: &mut StackReference,
        statement: &Statement<'_>,
    ) -> Result<bool> {
        match *statement.name.inner() {
            "template_url" => {
                stack.set_template_url(self.single(statement)?);
            }
            "timeout_minutes" => {
                stack.set_timeout_minutes(self.single(statement)?);
            }
            "parameters" => {
                self.no_block(statement)?;
                self.arity(statement, 1, 1)?;
                let parameters = self.hash_argument(&statement.arguments[0], "`parameters`")?;
                stack.set_parameters(parameters);
            }
            "parameter" => {
                self.no_block(statement)?;
                self.arity(statement, 2, 2)?;
                let name = self.text(&statement.arguments[0], "stack parameter name")?;
                let value = self.value(&statement.arguments[1])?;
                stack.set_parameter(name, value);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn output_attribute(&mut self, output: &mut Output, statement: &Statement<'_>) -> Result<bool> {
        match *statement.name.inner() {
            "description" => {
                output.set_description(self.single(statement)?);
            }
            "value" => {
                output.set_value(self.single(statement)?);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{lexer::tokenize, parser};
    use cftemplate_core::{diagnostic::Severity, node::ParameterKind};
    use serde_json::json;

    fn elaborate(source: &str) -> (Template, Vec<Issue>) {
        let raw = tokenize(source).unwrap_or_else(|e| panic!("Failed to tokenize: {e}"));
        let tokens = parser::significant_tokens(&raw);
        let statements = parser::build_program(&tokens, source.len())
            .unwrap_or_else(|e| panic!("Failed to parse: {e}"));
        let (template, issues) = Elaborator::new(source, "test.rb").run(&statements);
        (template, issues.into_issues())
    }

    fn codes(issues: &[Issue]) -> Vec<ErrorCode> {
        issues.iter().filter_map(Issue::code).collect()
    }

    #[test]
    fn test_parameter_block() {
        let (template, issues) = elaborate(
            r#"
parameter "BucketName", :string do
  description "Name of the bucket"
  length 3..63
  allowed_pattern "[a-z0-9-]+"
  default "assets"
  no_echo
end
"#,
        );

        assert!(issues.is_empty(), "unexpected issues: {issues:?}");
        let parameter = template.parameter("BucketName").unwrap();
        assert!(matches!(parameter.parameter_kind(), ParameterKind::String(_)));
        assert_eq!(parameter.description(), &Value::from("Name of the bucket"));
        assert_eq!(parameter.default_value(), &Value::from("assets"));
        assert_eq!(parameter.no_echo(), Some(true));
    }

    #[test]
    fn test_number_parameter_range() {
        let (template, issues) = elaborate("number_parameter \"Port\" do\n  range 1..65535\nend");

        assert!(issues.is_empty());
        let ParameterKind::Number(number) = template.parameter("Port").unwrap().parameter_kind()
        else {
            panic!("Expected number parameter");
        };
        assert_eq!(number.min_value(), &Value::Int(1));
        assert_eq!(number.max_value(), &Value::Int(65535));
    }

    #[test]
    fn test_resource_with_properties() {
        let (template, issues) = elaborate(
            r#"
resource "Bucket", "AWS::S3::Bucket" do
  properties "BucketName" => ref("BucketName"), "Tags" => [{ "Key" => "env", "Value" => :dev }]
  depends_on "Logs"
  deletion_policy :retain
end
"#,
        );

        assert!(issues.is_empty(), "unexpected issues: {issues:?}");
        let resource = template.resource("Bucket").unwrap();
        assert_eq!(resource.type_name(), Some("AWS::S3::Bucket"));
        assert_eq!(resource.dependency_names(), vec!["Logs"]);
        assert_eq!(resource.deletion_policy().map(|p| p.as_str()), Some("Retain"));
    }

    #[test]
    fn test_well_known_types_are_typed() {
        let (template, _) = elaborate(
            "resource \"Nested\", \"AWS::CloudFormation::Stack\" do\n  template_url \"https://x\"\nend",
        );
        assert!(template.resource("Nested").unwrap().as_wait_condition().is_none());
        assert_eq!(
            template.resource("Nested").unwrap().type_name(),
            Some("AWS::CloudFormation::Stack")
        );
    }

    #[test]
    fn test_wait_condition_gets_handle() {
        let (template, issues) = elaborate("wait_condition \"AppReady\" do\n  timeout 600\nend");

        assert!(issues.is_empty());
        assert!(template.resource("AppReadyHandle").is_some());
        let wait = template.resource("AppReady").unwrap().as_wait_condition().unwrap();
        assert!(wait.has_handle());
    }

    #[test]
    fn test_undefined_statement_in_block() {
        let (template, issues) = elaborate("output \"Url\" do\n  colour :red\n  value \"x\"\nend");

        assert_eq!(codes(&issues), vec![ErrorCode::E200]);
        assert_eq!(issues[0].message(), "undefined statement `colour` in output block");
        assert_eq!(issues[0].location(), Some("test.rb:2:3"));
        assert_eq!(template.output("Url").unwrap().value(), &Value::from("x"));
    }

    #[test]
    fn test_block_delegates_to_template() {
        let (template, issues) = elaborate(
            "resource \"Queue\", \"AWS::SQS::Queue\" do\n  parameter \"QueueName\"\nend",
        );

        assert!(issues.is_empty());
        assert!(template.parameter("QueueName").is_some());
        assert!(template.resource("Queue").is_some());
    }

    #[test]
    fn test_attribute_of_other_kind_is_undefined() {
        let (_, issues) = elaborate("list_parameter \"Subnets\" do\n  length 3\nend");
        assert_eq!(
            issues[0].message(),
            "undefined statement `length` in list parameter block"
        );
    }

    #[test]
    fn test_block_description_replacing_template_description_warns() {
        let (template, issues) = elaborate(
            r#"description "Top"
resource "Q" do
  type "AWS::SQS::Queue"
  description "inner"
end
"#,
        );

        assert_eq!(codes(&issues), vec![ErrorCode::E205]);
        assert_eq!(issues[0].severity(), Severity::Warn);
        assert_eq!(issues[0].location(), Some("test.rb:4:3"));
        assert_eq!(template.description(), &Value::from("inner"));
    }

    #[test]
    fn test_block_description_without_template_description() {
        let (template, issues) = elaborate(
            "resource \"Q\" do\n  type \"AWS::SQS::Queue\"\n  description \"only\"\nend",
        );

        assert!(issues.is_empty());
        assert_eq!(template.description(), &Value::from("only"));
    }

    #[test]
    fn test_unknown_top_level_statement() {
        let (_, issues) = elaborate("frobnicate \"x\"\ndescription \"still here\"");

        assert_eq!(codes(&issues), vec![ErrorCode::E200]);
        assert_eq!(issues[0].location(), Some("test.rb:1:1"));
    }

    #[test]
    fn test_unknown_parameter_type() {
        let (template, issues) = elaborate("parameter \"X\", :boolean");

        assert_eq!(codes(&issues), vec![ErrorCode::E204]);
        assert_eq!(issues[0].severity(), Severity::Error);
        assert!(template.parameter("X").is_none());
    }

    #[test]
    fn test_undefined_function() {
        let (_, issues) = elaborate("output \"X\", frob(\"a\")");
        assert_eq!(codes(&issues), vec![ErrorCode::E203]);
        assert_eq!(issues[0].message(), "undefined function `frob`");
    }

    #[test]
    fn test_wrong_arity() {
        let (_, issues) = elaborate("resource \"A\" do\n  property \"Key\"\nend");
        assert_eq!(codes(&issues), vec![ErrorCode::E201]);
        assert_eq!(issues[0].message(), "`property` expects 2 argument(s), got 1");
    }

    #[test]
    fn test_duplicate_definition_warns_and_replaces() {
        let (template, issues) = elaborate(
            "output \"X\", \"first\"\noutput \"X\", \"second\"",
        );

        assert_eq!(codes(&issues), vec![ErrorCode::E202]);
        assert_eq!(issues[0].severity(), Severity::Warn);
        assert_eq!(template.output("X").unwrap().value(), &Value::from("second"));
    }

    #[test]
    fn test_explicit_handle_after_wait_condition_is_not_duplicate() {
        let (_, issues) =
            elaborate("wait_condition \"Ready\"\nwait_condition_handle \"ReadyHandle\"");
        assert!(issues.is_empty());
    }

    #[test]
    fn test_intrinsics_lower_arguments() {
        let (template, issues) = elaborate(
            r#"output "Zone", select(0, get_azs)
output "Url", join("", ["https://", get_att("Bucket", "DomainName")])
output "Ami", find_in_map("RegionMap", ref("AWS::Region"), "AMI")"#,
        );

        assert!(issues.is_empty());
        let Value::Call(call) = template.output("Url").unwrap().value() else {
            panic!("Expected call");
        };
        assert_eq!(
            call.to_json(),
            json!({"Fn::Join": ["", ["https://", {"Fn::GetAtt": ["Bucket", "DomainName"]}]]})
        );
        let Value::Call(call) = template.output("Zone").unwrap().value() else {
            panic!("Expected call");
        };
        assert_eq!(
            call.to_json(),
            json!({"Fn::Select": [0, [{"Fn::GetAZs": {"Ref": "AWS::Region"}}]]})
        );
    }

    #[test]
    fn test_integer_hash_keys_are_stringified() {
        let (template, issues) = elaborate("mapping \"Ports\", 80 => \"http\"");
        assert!(issues.is_empty());
        assert_eq!(
            template.mapping("Ports").unwrap().get("80"),
            Some(&Value::from("http"))
        );
    }

    #[test]
    fn test_invalid_hash_key() {
        let (_, issues) = elaborate("mapping \"M\", [1] => \"x\"");
        assert_eq!(codes(&issues), vec![ErrorCode::E201]);
        assert_eq!(issues[0].message(), "hash key must be a string or symbol, found array");
    }
}
