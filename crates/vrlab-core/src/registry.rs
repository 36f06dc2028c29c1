use crate::node::{NodeConstructor, NodeDriver, NodeOptions};
use crate::CoreError;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;
use vrlab_schema::NodeSpec;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

struct KindEntry {
    constructor: NodeConstructor,
    credentials: Option<Credentials>,
}

/// Factory map from node kind name to driver constructor.
///
/// Built and owned by the orchestrator; kinds are added through explicit
/// registration calls.
#[derive(Default)]
pub struct NodeRegistry {
    kinds: BTreeMap<String, KindEntry>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every node kind shipped with vrlab.
    pub fn with_builtin_kinds() -> Result<Self, CoreError> {
        let mut registry = Self::new();
        crate::kinds::register_builtin(&mut registry)?;
        Ok(registry)
    }

    /// Register `constructor` under every name in `kind_names`.
    ///
    /// Fails without registering anything if one of the names is taken.
    pub fn register(
        &mut self,
        kind_names: &[&str],
        constructor: NodeConstructor,
    ) -> Result<(), CoreError> {
        if let Some(taken) = kind_names.iter().find(|k| self.kinds.contains_key(**k)) {
            return Err(CoreError::DuplicateKind((*taken).to_owned()));
        }
        for kind in kind_names {
            debug!("registering node kind {kind}");
            self.kinds.insert(
                (*kind).to_owned(),
                KindEntry {
                    constructor,
                    credentials: None,
                },
            );
        }
        Ok(())
    }

    pub fn set_default_credentials(
        &mut self,
        kind_names: &[&str],
        username: &str,
        password: &str,
    ) -> Result<(), CoreError> {
        if let Some(unknown) = kind_names.iter().find(|k| !self.kinds.contains_key(**k)) {
            return Err(CoreError::UnknownKind((*unknown).to_owned()));
        }
        for kind in kind_names {
            if let Some(entry) = self.kinds.get_mut(*kind) {
                entry.credentials = Some(Credentials {
                    username: username.to_owned(),
                    password: password.to_owned(),
                });
            }
        }
        Ok(())
    }

    /// Construct and initialize the driver for `spec.kind`.
    pub fn create(
        &self,
        spec: NodeSpec,
        options: NodeOptions,
    ) -> Result<Box<dyn NodeDriver>, CoreError> {
        let entry = self
            .kinds
            .get(&spec.kind)
            .ok_or_else(|| CoreError::UnknownKind(spec.kind.clone()))?;
        (entry.constructor)(spec, options)
    }

    pub fn credentials(&self, kind: &str) -> Option<&Credentials> {
        self.kinds.get(kind).and_then(|e| e.credentials.as_ref())
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }

    /// Registered kind names in sorted order.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }
}
