//! Boundary to the external provisioning engine.
//!
//! The orchestrator never creates anything itself: it hands each
//! [`Declaration`] to a [`Provisioner`] and receives a [`ResourceHandle`]
//! whose attributes resolve later. [`RecordingProvisioner`] is the
//! in-memory implementation used for planning, synthesis, and tests.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use xaas_common::error::{Result, XaasError};
use xaas_common::types::ResourceName;

use crate::graph::DependencyGraph;
use crate::kind::ResourceKind;
use crate::output::{Input, Output, Urn};

/// Handle to a declared resource.
///
/// Cheap to clone. Attribute accessors return lazy [`Output`]s; nothing
/// here ever reads a resolved value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ResourceHandle {
    urn: Urn,
}

impl ResourceHandle {
    /// Wraps an address.
    #[must_use]
    pub const fn new(urn: Urn) -> Self {
        Self { urn }
    }

    /// Address of the resource.
    #[must_use]
    pub const fn urn(&self) -> &Urn {
        &self.urn
    }

    /// Kind of the resource.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        self.urn.kind
    }

    /// Logical name of the resource.
    #[must_use]
    pub const fn name(&self) -> &ResourceName {
        &self.urn.name
    }

    /// Lazy reference to `attribute` of this resource.
    #[must_use]
    pub fn attr(&self, attribute: &str) -> Output {
        Output::attribute(self.urn.clone(), attribute)
    }

    /// Lazy provider-assigned identifier.
    #[must_use]
    pub fn id(&self) -> Output {
        self.attr("id")
    }

    /// Lazy ARN.
    #[must_use]
    pub fn arn(&self) -> Output {
        self.attr("arn")
    }
}

/// A request to declare one resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Declaration {
    /// Resource kind.
    pub kind: ResourceKind,
    /// Logical name, unique within the kind.
    pub name: ResourceName,
    /// Resource arguments.
    pub args: BTreeMap<String, Input>,
    /// Explicit dependencies beyond those implied by `args`.
    pub depends_on: Vec<Urn>,
}

impl Declaration {
    /// Starts a declaration with no arguments.
    #[must_use]
    pub const fn new(kind: ResourceKind, name: ResourceName) -> Self {
        Self {
            kind,
            name,
            args: BTreeMap::new(),
            depends_on: Vec::new(),
        }
    }

    /// Adds an argument.
    #[must_use]
    pub fn arg(mut self, key: impl Into<String>, value: impl Into<Input>) -> Self {
        let _ = self.args.insert(key.into(), value.into());
        self
    }

    /// Adds explicit dependencies.
    #[must_use]
    pub fn depends_on<'a>(mut self, handles: impl IntoIterator<Item = &'a ResourceHandle>) -> Self {
        self.depends_on
            .extend(handles.into_iter().map(|h| h.urn().clone()));
        self
    }

    /// Address this declaration will occupy.
    #[must_use]
    pub fn urn(&self) -> Urn {
        Urn::new(self.kind, self.name.clone())
    }

    /// Explicit and argument-implied dependencies, deduplicated.
    #[must_use]
    pub fn dependencies(&self) -> BTreeSet<&Urn> {
        let mut deps: BTreeSet<&Urn> = self.depends_on.iter().collect();
        for input in self.args.values() {
            deps.extend(input.references());
        }
        deps
    }
}

/// The provisioning API consumed by graph construction.
pub trait Provisioner {
    /// Declares a resource and returns its handle immediately.
    ///
    /// # Errors
    ///
    /// Returns [`XaasError::ResourceCreation`] if the declaration is
    /// rejected.
    fn declare(&mut self, declaration: Declaration) -> Result<ResourceHandle>;

    /// Publishes a named stack output.
    ///
    /// # Errors
    ///
    /// Returns [`XaasError::ResourceCreation`] if the export is rejected.
    fn export(&mut self, name: &str, value: Output) -> Result<()>;
}

/// In-memory provisioner that validates and records declarations.
///
/// Rejects duplicate addresses and references to undeclared resources,
/// builds the dependency graph, and resolves attributes the way a mock
/// provisioning engine would: `id` is `<name>_id`, `arn` is
/// `arn:aws:<service>:::<name>`, a gateway `url` is
/// `https://<name>_id.execute-api.localhost/stage/`, and any other
/// attribute is the logical name or a matching literal argument.
#[derive(Debug, Default)]
pub struct RecordingProvisioner {
    declarations: Vec<Declaration>,
    index: HashMap<Urn, usize>,
    graph: DependencyGraph,
    exports: BTreeMap<String, Output>,
    fail_on: Option<ResourceKind>,
}

impl RecordingProvisioner {
    /// Creates an empty provisioner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provisioner that rejects every declaration of `kind`.
    #[must_use]
    pub fn failing_on(kind: ResourceKind) -> Self {
        Self {
            fail_on: Some(kind),
            ..Self::default()
        }
    }

    /// All accepted declarations, in declaration order.
    #[must_use]
    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    /// Looks up an accepted declaration.
    #[must_use]
    pub fn get(&self, urn: &Urn) -> Option<&Declaration> {
        self.index.get(urn).map(|&i| &self.declarations[i])
    }

    /// Declarations of one kind, in declaration order.
    pub fn of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter().filter(move |d| d.kind == kind)
    }

    /// The dependency graph built so far.
    #[must_use]
    pub const fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Published outputs.
    #[must_use]
    pub const fn exports(&self) -> &BTreeMap<String, Output> {
        &self.exports
    }

    /// Resolves an attribute of a declared resource.
    #[must_use]
    pub fn attribute(&self, urn: &Urn, attribute: &str) -> Option<String> {
        let declaration = self.get(urn)?;
        let name = declaration.name.as_str();
        match attribute {
            "id" => Some(format!("{name}_id")),
            "arn" => Some(format!("arn:aws:{}:::{name}", urn.kind.service())),
            "url" if urn.kind == ResourceKind::RestApi => {
                Some(format!("https://{name}_id.execute-api.localhost/stage/"))
            }
            other => match declaration.args.get(other) {
                Some(input) => input.as_str().map(str::to_string),
                None => Some(name.to_string()),
            },
        }
    }

    /// Resolves an output against the recorded declarations.
    #[must_use]
    pub fn resolve(&self, output: &Output) -> Option<String> {
        output.resolve(&|urn: &Urn, attr: &str| self.attribute(urn, attr))
    }

    fn reject(declaration: &Declaration, message: impl Into<String>) -> XaasError {
        XaasError::ResourceCreation {
            kind: declaration.kind.to_string(),
            name: declaration.name.to_string(),
            message: message.into(),
        }
    }
}

impl Provisioner for RecordingProvisioner {
    fn declare(&mut self, declaration: Declaration) -> Result<ResourceHandle> {
        if self.fail_on == Some(declaration.kind) {
            return Err(Self::reject(&declaration, "rejected by provisioner"));
        }
        let urn = declaration.urn();
        if self.index.contains_key(&urn) {
            return Err(Self::reject(&declaration, "a resource with this name already exists"));
        }
        let deps: Vec<Urn> = declaration.dependencies().into_iter().cloned().collect();
        if let Some(missing) = deps.iter().find(|d| !self.index.contains_key(*d)) {
            return Err(Self::reject(
                &declaration,
                format!("depends on undeclared resource {missing}"),
            ));
        }

        let _ = self.graph.add_resource(urn.clone());
        for dep in &deps {
            self.graph.add_dependency(&urn, dep);
        }
        tracing::debug!(urn = %urn, deps = deps.len(), "resource declared");

        let _ = self.index.insert(urn.clone(), self.declarations.len());
        self.declarations.push(declaration);
        Ok(ResourceHandle::new(urn))
    }

    fn export(&mut self, name: &str, value: Output) -> Result<()> {
        if let Some(missing) = value.references().into_iter().find(|u| !self.index.contains_key(*u)) {
            return Err(XaasError::ResourceCreation {
                kind: "export".into(),
                name: name.to_string(),
                message: format!("references undeclared resource {missing}"),
            });
        }
        let _ = self.exports.insert(name.to_string(), value);
        Ok(())
    }
}
