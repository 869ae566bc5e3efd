//! The editing engine of one document.
//!
//! An [`Editor`] owns a [`Graph`], applies every mutation a user can trigger
//! (creation, edits, removal, resets, drag and drop, uploads and imports) and
//! reports each structural change to its [`Projections`].

pub mod dnd;
pub mod naming;

use serde::{Deserialize, Serialize};

use self::dnd::{DropContext, DropGesture, DropOutcome};
use crate::{
    ontology::{
        codec::guess_from_file_name, load_graph, presets, to_turtle, CodecError, Graph,
        GraphError, Iri, IriError, LangString, LoadOptions, NodeRef, Ontology, OntologyId,
        ResourceId, ResourceKind,
    },
    projection::{Modification, Projections, TreeNode, View, ViewListener},
};

/// Header of a fresh user ontology.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OntologyHeader {
    pub prefix: String,
    pub uri: String,
    pub fragment: String,
    pub name: String,
    pub instance_namespace: String,
    pub instance_prefix: String,
}

impl Default for OntologyHeader {
    fn default() -> Self {
        Self {
            prefix: "ex".to_string(),
            uri: "http://example.com/ex".to_string(),
            fragment: "/".to_string(),
            name: "Example".to_string(),
            instance_namespace: "http://example.com/inst#".to_string(),
            instance_prefix: "inst".to_string(),
        }
    }
}

impl OntologyHeader {
    fn apply(&self, ontology: &mut Ontology) {
        ontology.prefix.clone_from(&self.prefix);
        ontology.uri.clone_from(&self.uri);
        ontology.fragment.clone_from(&self.fragment);
        ontology.name.clone_from(&self.name);
        ontology.instance_namespace.clone_from(&self.instance_namespace);
        ontology.instance_prefix.clone_from(&self.instance_prefix);
    }

    /// Checks that the namespaces of the header are absolute IRIs.
    ///
    /// # Errors
    ///
    /// Returns the first invalid namespace.
    pub fn validate(&self) -> Result<(), IriError> {
        Iri::new(format!("{}{}", self.uri, self.fragment))?;
        Iri::new(self.instance_namespace.as_str())?;
        Ok(())
    }

    fn of(ontology: &Ontology) -> Self {
        Self {
            prefix: ontology.prefix.clone(),
            uri: ontology.uri.clone(),
            fragment: ontology.fragment.clone(),
            name: ontology.name.clone(),
            instance_namespace: ontology.instance_namespace.clone(),
            instance_prefix: ontology.instance_prefix.clone(),
        }
    }
}

/// Editable header fields of the user ontology.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HeaderField {
    Uri,
    Prefix,
    Name,
    Fragment,
    InstanceNamespace,
    InstancePrefix,
}

/// Editable text fields of a resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceField {
    #[serde(rename = "localName", alias = "localname")]
    LocalName,
    #[serde(rename = "label")]
    Label,
    #[serde(rename = "comment")]
    Comment,
}

/// Property references that can be cleared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResetField {
    Domain,
    Range,
    InverseOf,
}

/// Everything needed to create a resource in the user ontology.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceDraft {
    pub kind: ResourceKind,
    pub local_name: String,
    pub label: LangString,
    pub comment: LangString,
    /// Owning class of an instance.
    pub class: Option<ResourceId>,
}

impl ResourceDraft {
    #[must_use]
    pub fn new(kind: ResourceKind, local_name: impl Into<String>) -> Self {
        Self {
            kind,
            local_name: local_name.into(),
            label: LangString::new(),
            comment: LangString::new(),
            class: None,
        }
    }

    #[must_use]
    pub fn with_label(mut self, lang: &str, label: impl Into<String>) -> Self {
        self.label.set(lang, label);
        self
    }

    #[must_use]
    pub fn with_comment(mut self, lang: &str, comment: impl Into<String>) -> Self {
        self.comment.set(lang, comment);
        self
    }

    #[must_use]
    pub fn with_class(mut self, class: ResourceId) -> Self {
        self.class = Some(class);
        self
    }
}

#[derive(Debug)]
pub struct Editor {
    graph: Graph,
    projections: Projections,
    language: String,
    defaults: OntologyHeader,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(OntologyHeader::default(), "en")
    }
}

impl Editor {
    /// Creates an editor holding a blank user ontology described by `header`.
    #[must_use]
    pub fn new(header: OntologyHeader, language: impl Into<String>) -> Self {
        let mut editor = Self {
            graph: Graph::new(),
            projections: Projections::new(),
            language: language.into(),
            defaults: header,
        };
        let user = editor.graph.user_ontology();
        if let Some(ontology) = editor.graph.ontology_mut(user) {
            editor.defaults.apply(ontology);
        }
        editor
    }

    #[must_use]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn subscribe(&mut self, listener: impl ViewListener + 'static) {
        self.projections.subscribe(listener);
    }

    #[must_use]
    pub fn user_ontology(&self) -> OntologyId {
        self.graph.user_ontology()
    }

    /// Resolves a wire identity.
    #[must_use]
    pub fn resolve(&self, identity: u64) -> Option<NodeRef> {
        self.graph.find_by_identity(identity)
    }

    fn fire(&self, modification: Modification, node: impl Into<TreeNode>) {
        self.projections.fire(&self.graph, modification, node.into());
    }

    fn fire_user(&self, modification: Modification) {
        self.fire(modification, self.graph.user_ontology());
    }

    // ---------------------------------------------------------------------
    // header

    #[must_use]
    pub fn header(&self) -> OntologyHeader {
        self.graph
            .ontology(self.graph.user_ontology())
            .map(OntologyHeader::of)
            .unwrap_or_default()
    }

    /// Edits one header field. Namespaces must be absolute IRIs.
    ///
    /// # Errors
    ///
    /// Fails when `value` is not a valid IRI for `Uri` or
    /// `InstanceNamespace`; the header is left unchanged.
    pub fn set_header(
        &mut self,
        field: HeaderField,
        value: impl Into<String>,
    ) -> Result<(), IriError> {
        let value = value.into();
        if matches!(field, HeaderField::Uri | HeaderField::InstanceNamespace) {
            value.parse::<Iri>()?;
        }
        let user = self.graph.user_ontology();
        let Some(ontology) = self.graph.ontology_mut(user) else {
            return Ok(());
        };
        match field {
            HeaderField::Uri => ontology.uri = value,
            HeaderField::Prefix => ontology.prefix = value,
            HeaderField::Name => ontology.name = value,
            HeaderField::Fragment => ontology.fragment = value,
            HeaderField::InstanceNamespace => ontology.instance_namespace = value,
            HeaderField::InstancePrefix => ontology.instance_prefix = value,
        }
        self.fire_user(Modification::Changed);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // resources

    /// Creates a resource in the user ontology. Classes, datatypes and
    /// properties become roots; an instance needs a class and returns `None`
    /// without one.
    ///
    /// A blank local name is derived from the label, preferring the editor
    /// language. A terminology resource without a label is labelled from its
    /// local name. Nothing is created when neither is given.
    ///
    /// # Errors
    ///
    /// Fails when the draft's class does not exist or cannot hold instances.
    pub fn create_resource(
        &mut self,
        mut draft: ResourceDraft,
    ) -> Result<Option<ResourceId>, GraphError> {
        let user = self.graph.user_ontology();
        if draft.kind == ResourceKind::Instance && draft.class.is_none() {
            tracing::debug!(local_name = draft.local_name, "instance without class not created");
            return Ok(None);
        }
        if draft.local_name.trim().is_empty() {
            draft.local_name = self
                .label_for_naming(&draft.label)
                .map(|label| naming::label_to_local_name(label, draft.kind))
                .unwrap_or_default();
        }
        if draft.local_name.is_empty() {
            tracing::debug!(kind = ?draft.kind, "resource without name or label not created");
            return Ok(None);
        }
        if draft.label.is_empty() && draft.kind.root_list().is_some() {
            draft
                .label
                .set(self.language.clone(), naming::local_name_to_label(&draft.local_name));
        }

        let id = self
            .graph
            .create_resource(user, draft.kind, draft.local_name)?;
        if let Some(resource) = self.graph.resource_mut(id) {
            resource.label = draft.label;
            resource.comment = draft.comment;
        }

        match draft.kind {
            ResourceKind::Class | ResourceKind::Datatype | ResourceKind::Property => {
                self.graph.add_root(user, id)?;
                self.fire(Modification::Inserted, id);
            }
            ResourceKind::Instance => {
                if let Some(class) = draft.class {
                    self.graph.add_instance(class, id)?;
                    self.fire(Modification::Changed, class);
                }
            }
            ResourceKind::Literal => {}
        }
        Ok(Some(id))
    }

    fn label_for_naming<'a>(&self, label: &'a LangString) -> Option<&'a str> {
        label
            .get(&self.language)
            .into_iter()
            .chain(label.iter().map(|(_, value)| value))
            .find(|value| !value.trim().is_empty())
    }

    /// Creates an instance with a generated local name under `class`.
    ///
    /// # Errors
    ///
    /// Fails when `class` is not a class.
    pub fn create_instance(&mut self, class: ResourceId) -> Result<ResourceId, GraphError> {
        let local_name = format!("I{}", uuid::Uuid::new_v4());
        let draft = ResourceDraft::new(ResourceKind::Instance, local_name).with_class(class);
        self.create_resource(draft)?
            .ok_or(GraphError::MissingResource(class))
    }

    /// Whether clients may edit `id`: resources of the user ontology and
    /// imported copies are editable, terms of other ontologies are not.
    #[must_use]
    pub fn is_editable(&self, id: ResourceId) -> bool {
        self.graph.resource(id).is_some_and(|resource| {
            resource.imported || resource.owner() == self.graph.user_ontology()
        })
    }

    /// Edits one text field. Returns `false` for a resource that is unknown
    /// or not editable.
    pub fn change_resource(
        &mut self,
        id: ResourceId,
        field: ResourceField,
        lang: &str,
        value: impl Into<String>,
    ) -> bool {
        if !self.is_editable(id) {
            return false;
        }
        let Some(resource) = self.graph.resource_mut(id) else {
            return false;
        };
        let value = value.into();
        match field {
            ResourceField::LocalName => resource.local_name = value,
            ResourceField::Label => resource.label.set(lang, value),
            ResourceField::Comment => resource.comment.set(lang, value),
        }
        self.fire(Modification::Changed, id);
        true
    }

    /// Removes a resource or unloads an imported ontology.
    pub fn remove(&mut self, node: NodeRef) -> bool {
        match node {
            NodeRef::Ontology(id) => self.remove_ontology(id),
            NodeRef::Resource(id) => self.remove_resource(id),
        }
    }

    /// Unloads an imported ontology. The user ontology stays.
    pub fn remove_ontology(&mut self, id: OntologyId) -> bool {
        let events = Projections::capture(&self.graph, Modification::Removed, id.into());
        if !self.graph.unload_ontology(id) {
            return false;
        }
        self.projections.dispatch(&events);
        true
    }

    /// Detaches an editable resource from its tree. Instances lose every link
    /// they take part in; properties lose their inverse pairs.
    pub fn remove_resource(&mut self, id: ResourceId) -> bool {
        if !self.is_editable(id) {
            return false;
        }
        let Some(resource) = self.graph.resource(id) else {
            return false;
        };
        let kind = resource.kind();
        let parent = resource.parent();

        match kind {
            ResourceKind::Instance => {
                let removed = parent.is_some_and(|class| self.graph.remove_instance(class, id));
                let links = self.graph.remove_links_having(id);
                if let Some(class) = parent {
                    self.fire(Modification::Changed, class);
                }
                removed || links > 0
            }
            ResourceKind::Literal => self.graph.remove_links_having(id) > 0,
            ResourceKind::Class | ResourceKind::Datatype | ResourceKind::Property => {
                let events = Projections::capture(&self.graph, Modification::Removed, id.into());
                let detached = match parent {
                    Some(parent) => self.graph.remove_child(parent, id),
                    None => self
                        .graph
                        .root_host(id)
                        .is_some_and(|host| self.graph.remove_from_root(host, id)),
                };
                if kind == ResourceKind::Property {
                    let loaded = self.graph.loaded().to_vec();
                    for ontology in loaded {
                        self.graph.remove_inverse_of(ontology, id);
                    }
                }
                if detached {
                    self.projections.dispatch(&events);
                }
                detached
            }
        }
    }

    /// Clears a property reference. Returns `false` when `id` is not an
    /// editable property.
    pub fn reset(&mut self, field: ResetField, id: ResourceId) -> bool {
        if self.graph.kind_of(id) != Some(ResourceKind::Property) || !self.is_editable(id) {
            return false;
        }
        let user = self.graph.user_ontology();
        let changed = match field {
            ResetField::Domain => self.graph.set_domain(id, None).is_ok(),
            ResetField::Range => self.graph.set_range(id, None).is_ok(),
            ResetField::InverseOf => {
                self.graph.remove_inverse_of(user, id);
                true
            }
        };
        if changed {
            self.fire(Modification::Changed, id);
        }
        changed
    }

    /// Asserts `subject property object`.
    ///
    /// # Errors
    ///
    /// Fails when `property` is not a property.
    pub fn add_link(
        &mut self,
        property: ResourceId,
        subject: ResourceId,
        object: ResourceId,
    ) -> Result<bool, GraphError> {
        let added = self.graph.add_link(property, subject, object)?;
        if added {
            self.fire(Modification::Changed, property);
        }
        Ok(added)
    }

    /// Retracts `subject property object`.
    ///
    /// # Errors
    ///
    /// Fails when `property` is not a property.
    pub fn remove_link(
        &mut self,
        property: ResourceId,
        subject: ResourceId,
        object: ResourceId,
    ) -> Result<bool, GraphError> {
        let removed = self.graph.remove_link(property, subject, object)?;
        if removed {
            self.fire(Modification::Changed, property);
        }
        Ok(removed)
    }

    // ---------------------------------------------------------------------
    // drag and drop

    /// Resolves a gesture against the rule table.
    ///
    /// # Errors
    ///
    /// Propagates a graph failure of the matched rule.
    pub fn drag_and_drop(&mut self, gesture: &DropGesture) -> Result<DropOutcome, GraphError> {
        let mut ctx = DropContext {
            graph: &mut self.graph,
            projections: &self.projections,
            language: &self.language,
        };
        dnd::resolve(&mut ctx, gesture)
    }

    /// Drag and drop addressed by wire identities. Unknown identities are a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Propagates a graph failure of the matched rule.
    pub fn drag_and_drop_identities(
        &mut self,
        source_view: View,
        source: u64,
        target_view: View,
        target: u64,
        modifier: bool,
    ) -> Result<DropOutcome, GraphError> {
        let (Some(source), Some(target)) = (self.resolve(source), self.resolve(target)) else {
            tracing::debug!(source, target, "drop on unknown identity ignored");
            return Ok(DropOutcome::NoMatch);
        };
        let gesture =
            DropGesture::new(source_view, source, target_view, target).with_modifier(modifier);
        self.drag_and_drop(&gesture)
    }

    // ---------------------------------------------------------------------
    // documents

    /// Replaces the user ontology with the parsed document.
    ///
    /// # Errors
    ///
    /// Fails when no supported format parses `bytes`; the document is left
    /// unchanged.
    pub fn upload(&mut self, bytes: &[u8], file_name: &str) -> Result<OntologyId, CodecError> {
        let (prefix, format) = guess_from_file_name(file_name);
        let options = LoadOptions::new(prefix).with_format(format);
        let id = load_graph(&mut self.graph, bytes, &options)?;
        if let Some(ontology) = self.graph.ontology_mut(id) {
            if ontology.instance_namespace.is_empty() {
                ontology
                    .instance_namespace
                    .clone_from(&self.defaults.instance_namespace);
            }
            if ontology.instance_prefix.is_empty() {
                ontology
                    .instance_prefix
                    .clone_from(&self.defaults.instance_prefix);
            }
        }
        self.graph.set_user_ontology(id)?;
        tracing::info!(prefix = options.prefix, ontology = %id, "user ontology replaced");
        self.fire(Modification::Structure, id);
        Ok(id)
    }

    /// Loads a document next to the user ontology. A document whose prefix is
    /// already loaded is not parsed again.
    ///
    /// # Errors
    ///
    /// Fails when no supported format parses `bytes`.
    pub fn import(&mut self, bytes: &[u8], file_name: &str) -> Result<OntologyId, CodecError> {
        let (prefix, format) = guess_from_file_name(file_name);
        self.import_with(bytes, LoadOptions::new(prefix).with_format(format))
    }

    fn import_with(&mut self, bytes: &[u8], options: LoadOptions) -> Result<OntologyId, CodecError> {
        if let Some(existing) = self.graph.find_loaded_by_prefix(&options.prefix) {
            tracing::debug!(prefix = options.prefix, "ontology already loaded");
            return Ok(existing);
        }
        let id = load_graph(&mut self.graph, bytes, &options)?;
        self.graph.load(id)?;
        tracing::info!(prefix = options.prefix, ontology = %id, "ontology imported");
        self.fire(Modification::Inserted, id);
        Ok(id)
    }

    /// Imports a bundled vocabulary, terminology only.
    ///
    /// # Errors
    ///
    /// Fails for an unknown preset name.
    pub fn import_preset(&mut self, name: &str) -> Result<OntologyId, CodecError> {
        let preset = presets::find(name).ok_or_else(|| CodecError::UnknownPreset(name.to_string()))?;
        let options = LoadOptions::new(preset.name)
            .with_format(Some(preset.format()))
            .terminology_only();
        self.import_with(preset.turtle.as_bytes(), options)
    }

    /// Serializes the user ontology.
    ///
    /// # Errors
    ///
    /// Fails when a term cannot be written as Turtle.
    pub fn to_turtle(&self) -> Result<String, CodecError> {
        to_turtle(&self.graph, self.graph.user_ontology())
    }
}
