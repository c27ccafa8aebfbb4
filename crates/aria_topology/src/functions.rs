//! Intrinsic functions.
//!
//! A function marker is a single-entry map whose key names a function in the
//! [`FunctionTable`], e.g. `{get_input: port}`. [`evaluate`] rebuilds a
//! value with every marker replaced by its result; it runs on demand, once
//! per requested value, against a [`RuntimeContext`].

use crate::model::Topology;
use aria_core::{Map, Value};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Entity keyword for the template owning the value
pub const SELF: &str = "SELF";
/// Entity keyword for a relationship's source template
pub const SOURCE: &str = "SOURCE";
/// Entity keyword for a relationship's target template
pub const TARGET: &str = "TARGET";

/// Deepest chain of fetched values that are evaluated in turn
pub const MAX_DEPTH: usize = 32;

/// Function evaluation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FunctionError {
    /// No function of that name is registered
    #[error("unknown function \"{name}\"")]
    UnknownFunction {
        /// Function name
        name: String,
    },

    /// Wrong number of arguments
    #[error("{function} takes {expected} arguments, got {actual}")]
    Arity {
        /// Function name
        function: String,
        /// Accepted argument counts
        expected: String,
        /// Supplied argument count
        actual: usize,
    },

    /// An argument has the wrong shape
    #[error("{function}: {message}")]
    InvalidArgument {
        /// Function name
        function: String,
        /// Problem description
        message: String,
    },

    /// The context has no value for the reference
    #[error("{function}: cannot resolve {reference}")]
    Unresolved {
        /// Function name
        function: String,
        /// What was looked up
        reference: String,
    },

    /// Fetched values keep referring to further values
    #[error("{function}: {reference} nests more than {max} references deep", max = MAX_DEPTH)]
    TooDeep {
        /// Function name
        function: String,
        /// Reference being fetched when the limit was hit
        reference: String,
    },
}

/// Lookup interface the evaluator runs against
pub trait RuntimeContext {
    /// Deployment input value
    fn input(&self, name: &str) -> Option<Value>;

    /// Property of a node template, addressed by a path of keys
    fn node_property(&self, node: &str, path: &[&str]) -> Option<Value>;

    /// Runtime attribute of a node template
    fn node_attribute(&self, node: &str, path: &[&str]) -> Option<Value>;
}

/// Templates the `SELF`, `SOURCE` and `TARGET` keywords stand for
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvalScope {
    /// Template owning the evaluated value
    pub self_name: Option<String>,
    /// Relationship source
    pub source: Option<String>,
    /// Relationship target
    pub target: Option<String>,
}

impl EvalScope {
    /// Create a scope with no entities bound
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scope of a node template's own values
    #[must_use]
    pub fn of_node(name: impl Into<String>) -> Self {
        Self::new().with_self(name)
    }

    /// Set the `SELF` template
    #[must_use]
    pub fn with_self(mut self, name: impl Into<String>) -> Self {
        self.self_name = Some(name.into());
        self
    }

    /// Set the `SOURCE` template
    #[must_use]
    pub fn with_source(mut self, name: impl Into<String>) -> Self {
        self.source = Some(name.into());
        self
    }

    /// Set the `TARGET` template
    #[must_use]
    pub fn with_target(mut self, name: impl Into<String>) -> Self {
        self.target = Some(name.into());
        self
    }

    /// Resolve an entity argument to a template name.
    ///
    /// Anything but a keyword is taken as a template name.
    ///
    /// # Errors
    ///
    /// Returns `Unresolved` if a keyword is not bound in this scope
    pub fn entity<'s>(&'s self, function: &str, entity: &'s str) -> Result<&'s str, FunctionError> {
        let bound = match entity {
            SELF => self.self_name.as_deref(),
            SOURCE => self.source.as_deref(),
            TARGET => self.target.as_deref(),
            name => Some(name),
        };
        bound.ok_or_else(|| FunctionError::Unresolved {
            function: function.to_string(),
            reference: entity.to_string(),
        })
    }
}

/// Function implementation: evaluated arguments in, result out
pub type FunctionHandler =
    Arc<dyn Fn(&[Value], &Evaluation<'_>) -> Result<Value, FunctionError> + Send + Sync>;

/// One evaluation pass: the table, the context and the current scope
#[derive(Clone, Copy)]
pub struct Evaluation<'a> {
    /// Functions markers resolve against
    pub table: &'a FunctionTable,
    /// Lookup interface
    pub ctx: &'a dyn RuntimeContext,
    /// Entities the keywords stand for
    pub scope: &'a EvalScope,
    depth: usize,
}

impl<'a> Evaluation<'a> {
    /// Start an evaluation at depth zero
    #[must_use]
    pub fn new(table: &'a FunctionTable, ctx: &'a dyn RuntimeContext, scope: &'a EvalScope) -> Self {
        Self {
            table,
            ctx,
            scope,
            depth: 0,
        }
    }

    /// Replace every function marker in `value`, innermost arguments first
    ///
    /// # Errors
    ///
    /// Returns the first function error met
    pub fn evaluate(&self, value: &Value) -> Result<Value, FunctionError> {
        if let Some((name, arg)) = self.table.marker(value) {
            let args = marker_args(arg)
                .into_iter()
                .map(|arg| self.evaluate(arg))
                .collect::<Result<Vec<_>, _>>()?;
            return self.table.call(name, &args, self);
        }
        Ok(match value {
            Value::List(items) => Value::List(
                items
                    .iter()
                    .map(|item| self.evaluate(item))
                    .collect::<Result<_, _>>()?,
            ),
            Value::Map(map) => {
                let mut out = Map::new();
                for (key, item) in map {
                    out.insert(key.clone(), self.evaluate(item)?);
                }
                Value::Map(out)
            }
            scalar => scalar.clone(),
        })
    }

    /// Evaluate a value fetched from `node`, with `SELF` bound to that node
    ///
    /// # Errors
    ///
    /// Returns `TooDeep` past [`MAX_DEPTH`] nested fetches, or the first
    /// function error met
    pub fn evaluate_fetched(
        &self,
        function: &str,
        reference: impl FnOnce() -> String,
        node: &str,
        value: &Value,
    ) -> Result<Value, FunctionError> {
        if self.depth >= MAX_DEPTH {
            return Err(FunctionError::TooDeep {
                function: function.to_string(),
                reference: reference(),
            });
        }
        let scope = EvalScope::of_node(node);
        Evaluation {
            table: self.table,
            ctx: self.ctx,
            scope: &scope,
            depth: self.depth + 1,
        }
        .evaluate(value)
    }
}

impl fmt::Debug for Evaluation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evaluation")
            .field("scope", self.scope)
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}

/// Intrinsic function definition
#[derive(Clone)]
pub struct Function {
    /// Marker key
    pub name: String,
    /// Fewest accepted arguments
    pub min_args: usize,
    /// Most accepted arguments, `None` for variadic
    pub max_args: Option<usize>,
    handler: FunctionHandler,
}

impl Function {
    /// Create a function definition
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        min_args: usize,
        max_args: Option<usize>,
        handler: FunctionHandler,
    ) -> Self {
        Self {
            name: name.into(),
            min_args,
            max_args,
            handler,
        }
    }

    /// Call with already evaluated arguments
    ///
    /// # Errors
    ///
    /// Returns `Arity` on a wrong argument count, or the handler's error
    pub fn call(&self, args: &[Value], eval: &Evaluation<'_>) -> Result<Value, FunctionError> {
        let fits = args.len() >= self.min_args && self.max_args.is_none_or(|max| args.len() <= max);
        if !fits {
            let expected = match self.max_args {
                Some(max) if max == self.min_args => max.to_string(),
                Some(max) => format!("{}..={}", self.min_args, max),
                None => format!("at least {}", self.min_args),
            };
            return Err(FunctionError::Arity {
                function: self.name.clone(),
                expected,
                actual: args.len(),
            });
        }
        (self.handler)(args, eval)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("min_args", &self.min_args)
            .field("max_args", &self.max_args)
            .finish_non_exhaustive()
    }
}

/// Registered intrinsic functions by marker key
#[derive(Debug, Clone, Default)]
pub struct FunctionTable {
    functions: IndexMap<String, Function>,
}

impl FunctionTable {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self {
            functions: IndexMap::new(),
        }
    }

    /// Register a function, replacing any of the same name
    pub fn register(&mut self, function: Function) {
        self.functions.insert(function.name.clone(), function);
    }

    /// Look up a function
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    /// Registered function names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    /// Call a function by name
    ///
    /// # Errors
    ///
    /// Returns `UnknownFunction` or the function's error
    pub fn call(&self, name: &str, args: &[Value], eval: &Evaluation<'_>) -> Result<Value, FunctionError> {
        self.get(name)
            .ok_or_else(|| FunctionError::UnknownFunction {
                name: name.to_string(),
            })?
            .call(args, eval)
    }

    /// Function name and raw argument of a marker value
    #[must_use]
    pub fn marker<'v>(&self, value: &'v Value) -> Option<(&'v str, &'v Value)> {
        let map = value.as_map().filter(|map| map.len() == 1)?;
        let (name, arg) = map.iter().next()?;
        self.functions.contains_key(name).then_some((name.as_str(), arg))
    }

    /// Table with `get_input`, `get_property`, `get_attribute` and `concat`
    #[must_use]
    pub fn standard() -> Self {
        let mut table = Self::new();

        table.register(Function::new(
            "get_input",
            1,
            Some(1),
            Arc::new(|args: &[Value], eval: &Evaluation<'_>| {
                let name = string_arg("get_input", &args[0])?;
                eval.ctx.input(name).ok_or_else(|| FunctionError::Unresolved {
                    function: "get_input".to_string(),
                    reference: format!("input \"{}\"", name),
                })
            }),
        ));

        table.register(Function::new(
            "get_property",
            2,
            None,
            Arc::new(|args: &[Value], eval: &Evaluation<'_>| {
                let (node, path) = node_path("get_property", args, eval.scope)?;
                let reference = || format!("property {} of \"{}\"", path.join("."), node);
                let fetched = eval.ctx.node_property(node, &path).ok_or_else(|| {
                    FunctionError::Unresolved {
                        function: "get_property".to_string(),
                        reference: reference(),
                    }
                })?;
                eval.evaluate_fetched("get_property", reference, node, &fetched)
            }),
        ));

        table.register(Function::new(
            "get_attribute",
            2,
            None,
            Arc::new(|args: &[Value], eval: &Evaluation<'_>| {
                let (node, path) = node_path("get_attribute", args, eval.scope)?;
                let reference = || format!("attribute {} of \"{}\"", path.join("."), node);
                let fetched = eval.ctx.node_attribute(node, &path).ok_or_else(|| {
                    FunctionError::Unresolved {
                        function: "get_attribute".to_string(),
                        reference: reference(),
                    }
                })?;
                eval.evaluate_fetched("get_attribute", reference, node, &fetched)
            }),
        ));

        table.register(Function::new(
            "concat",
            1,
            None,
            Arc::new(|args: &[Value], _eval: &Evaluation<'_>| {
                let mut joined = String::new();
                for arg in args {
                    match arg {
                        Value::List(_) | Value::Map(_) => {
                            return Err(FunctionError::InvalidArgument {
                                function: "concat".to_string(),
                                message: format!("cannot concatenate a {}", arg.kind_name()),
                            });
                        }
                        scalar => joined.push_str(&scalar.to_plain_string()),
                    }
                }
                Ok(Value::String(joined))
            }),
        ));

        table
    }
}

fn string_arg<'v>(function: &str, value: &'v Value) -> Result<&'v str, FunctionError> {
    value.as_str().ok_or_else(|| FunctionError::InvalidArgument {
        function: function.to_string(),
        message: format!("expected a string, got a {}", value.kind_name()),
    })
}

fn node_path<'a>(
    function: &str,
    args: &'a [Value],
    scope: &'a EvalScope,
) -> Result<(&'a str, Vec<&'a str>), FunctionError> {
    let entity = string_arg(function, &args[0])?;
    let node = scope.entity(function, entity)?;
    let path = args[1..]
        .iter()
        .map(|arg| string_arg(function, arg))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((node, path))
}

/// Arguments of a marker: a list is the argument list, anything else one argument
fn marker_args(arg: &Value) -> Vec<&Value> {
    match arg {
        Value::List(items) => items.iter().collect(),
        single => vec![single],
    }
}

/// Replace every function marker in `value`, innermost arguments first.
///
/// Values fetched by `get_property` and `get_attribute` are evaluated in
/// turn, with `SELF` bound to the node they were fetched from.
///
/// # Errors
///
/// Returns the first function error met
pub fn evaluate(
    value: &Value,
    table: &FunctionTable,
    ctx: &dyn RuntimeContext,
    scope: &EvalScope,
) -> Result<Value, FunctionError> {
    Evaluation::new(table, ctx, scope).evaluate(value)
}

/// Check if `value` holds any function marker
#[must_use]
pub fn contains_functions(value: &Value, table: &FunctionTable) -> bool {
    if table.marker(value).is_some() {
        return true;
    }
    match value {
        Value::List(items) => items.iter().any(|item| contains_functions(item, table)),
        Value::Map(map) => map.values().any(|item| contains_functions(item, table)),
        _ => false,
    }
}

/// Plan-time context over a normalized [`Topology`].
///
/// Properties fall back to capability properties when the first path key
/// names a capability. Attributes only exist at runtime and never resolve.
#[derive(Debug, Clone, Copy)]
pub struct TopologyContext<'t> {
    topology: &'t Topology,
}

impl<'t> TopologyContext<'t> {
    /// Create a context over a topology
    #[must_use]
    pub fn new(topology: &'t Topology) -> Self {
        Self { topology }
    }
}

impl RuntimeContext for TopologyContext<'_> {
    fn input(&self, name: &str) -> Option<Value> {
        self.topology.inputs.get(name).cloned()
    }

    fn node_property(&self, node: &str, path: &[&str]) -> Option<Value> {
        if let Some(value) = self.topology.property(node, path) {
            return Some(value.clone());
        }
        let (capability, rest) = path.split_first()?;
        let (first, rest) = rest.split_first()?;
        let mut value = self
            .topology
            .get(node)?
            .capabilities
            .get(*capability)?
            .properties
            .get(*first)?;
        for key in rest {
            value = value.get(key)?;
        }
        Some(value.clone())
    }

    fn node_attribute(&self, _node: &str, _path: &[&str]) -> Option<Value> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CapabilityInstance, NodeTemplate, Scaling};
    use aria_types::Occurrences;

    fn value(yaml: &str) -> Value {
        let raw: serde_yaml::Value = serde_yaml::from_str(yaml).unwrap();
        Value::from(raw)
    }

    fn topology() -> Topology {
        let mut topology = Topology::default();
        topology.inputs.insert("port".to_string(), Value::Integer(8080));
        topology.inputs.insert("host".to_string(), Value::from("example.org"));

        let mut capabilities = IndexMap::new();
        capabilities.insert(
            "endpoint".to_string(),
            CapabilityInstance {
                type_name: "Endpoint".to_string(),
                occurrences: Occurrences::CAPABILITY,
                current_occ: 0,
                properties: value("{protocol: https}").as_map().cloned().unwrap(),
            },
        );
        topology.node_templates.insert(
            "web".to_string(),
            NodeTemplate {
                name: "web".to_string(),
                type_name: "Server".to_string(),
                type_hierarchy: vec!["Server".to_string()],
                properties: value("{port: {get_input: port}, tags: {env: prod}}")
                    .as_map()
                    .cloned()
                    .unwrap(),
                capabilities,
                relationships: Vec::new(),
                interfaces: IndexMap::new(),
                scaling: Scaling::default(),
            },
        );
        topology
    }

    #[test]
    fn test_get_input() {
        let topology = topology();
        let ctx = TopologyContext::new(&topology);
        let table = FunctionTable::standard();
        let result = evaluate(&value("{get_input: port}"), &table, &ctx, &EvalScope::new()).unwrap();
        assert_eq!(result, Value::Integer(8080));
    }

    #[test]
    fn test_nested_evaluation() {
        let topology = topology();
        let ctx = TopologyContext::new(&topology);
        let table = FunctionTable::standard();
        let input = value(
            "{url: {concat: ['https://', {get_input: host}, ':', {get_input: port}]}, plain: [1, {get_input: host}]}",
        );
        let result = evaluate(&input, &table, &ctx, &EvalScope::new()).unwrap();
        assert_eq!(result, value("{url: 'https://example.org:8080', plain: [1, example.org]}"));
    }

    #[test]
    fn test_get_property_entities() {
        let topology = topology();
        let ctx = TopologyContext::new(&topology);
        let table = FunctionTable::standard();

        let scope = EvalScope::of_node("web");
        let env = evaluate(&value("{get_property: [SELF, tags, env]}"), &table, &ctx, &scope).unwrap();
        assert_eq!(env, Value::from("prod"));

        // The stored property is itself a marker and resolves in turn.
        let port = evaluate(&value("{get_property: [web, port]}"), &table, &ctx, &EvalScope::new()).unwrap();
        assert_eq!(port, Value::Integer(8080));

        let scope = EvalScope::new().with_target("web");
        let protocol = evaluate(&value("{get_property: [TARGET, endpoint, protocol]}"), &table, &ctx, &scope).unwrap();
        assert_eq!(protocol, Value::from("https"));

        let err = evaluate(&value("{get_property: [SOURCE, port]}"), &table, &ctx, &scope).unwrap_err();
        assert!(matches!(err, FunctionError::Unresolved { .. }));
    }

    #[test]
    fn test_fetched_values_rebind_self() {
        let mut topology = topology();
        let web = topology.node_templates.get_mut("web").unwrap();
        web.properties.insert("url".to_string(), value("{concat: [{get_property: [SELF, tags, env]}, ':', {get_property: [SELF, port]}]}"));
        let ctx = TopologyContext::new(&topology);
        let table = FunctionTable::standard();

        let scope = EvalScope::of_node("db");
        let url = evaluate(&value("{get_property: [web, url]}"), &table, &ctx, &scope).unwrap();
        assert_eq!(url, Value::from("prod:8080"));
    }

    #[test]
    fn test_self_reference_is_bounded() {
        let mut topology = topology();
        let web = topology.node_templates.get_mut("web").unwrap();
        web.properties.insert("loop".to_string(), value("{get_property: [SELF, loop]}"));
        let ctx = TopologyContext::new(&topology);
        let table = FunctionTable::standard();

        let err = evaluate(&value("{get_property: [web, loop]}"), &table, &ctx, &EvalScope::new()).unwrap_err();
        assert!(matches!(err, FunctionError::TooDeep { .. }), "{:?}", err);
    }

    #[test]
    fn test_attributes_unavailable() {
        let topology = topology();
        let ctx = TopologyContext::new(&topology);
        let table = FunctionTable::standard();
        let err = evaluate(&value("{get_attribute: [web, ip]}"), &table, &ctx, &EvalScope::new()).unwrap_err();
        assert!(matches!(err, FunctionError::Unresolved { .. }));
    }

    #[test]
    fn test_arity_and_arguments() {
        let topology = topology();
        let ctx = TopologyContext::new(&topology);
        let table = FunctionTable::standard();

        let err = evaluate(&value("{get_input: [a, b]}"), &table, &ctx, &EvalScope::new()).unwrap_err();
        assert_eq!(err.to_string(), "get_input takes 1 arguments, got 2");

        let err = evaluate(&value("{get_property: [web]}"), &table, &ctx, &EvalScope::new()).unwrap_err();
        assert!(matches!(err, FunctionError::Arity { .. }));

        let err = evaluate(&value("{concat: [a, [b]]}"), &table, &ctx, &EvalScope::new()).unwrap_err();
        assert!(matches!(err, FunctionError::InvalidArgument { .. }));

        let scope = EvalScope::new();
        let err = table
            .call("get_secret", &[], &Evaluation::new(&table, &ctx, &scope))
            .unwrap_err();
        assert!(matches!(err, FunctionError::UnknownFunction { .. }));
    }

    #[test]
    fn test_contains_functions() {
        let table = FunctionTable::standard();
        assert!(contains_functions(&value("{a: [1, {get_input: x}]}"), &table));
        assert!(!contains_functions(&value("{a: [1, {get_secret: x}]}"), &table));
        assert!(!contains_functions(&value("{get_input: x, other: 1}"), &table));
        assert!(!contains_functions(&Value::Integer(3), &table));
    }

    #[test]
    fn test_markers_pass_through_unchanged_without_functions() {
        let topology = topology();
        let ctx = TopologyContext::new(&topology);
        let input = value("{get_input: port}");
        let result = evaluate(&input, &FunctionTable::new(), &ctx, &EvalScope::new()).unwrap();
        assert_eq!(result, input);
    }
}
