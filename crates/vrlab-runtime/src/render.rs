use gtmpl_value::Value;
use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use thiserror::Error;
use vrlab_schema::NodeSpec;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("render I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("template error: {0}")]
    Template(String),
}

/// Produces device configuration text from a template.
pub trait ConfigRenderer: Send + Sync {
    /// Render `template` and write the result to `dest`.
    fn generate_config(&self, dest: &Path, template: &str) -> Result<(), RenderError>;
}

/// Renders Go `text/template` syntax against a node spec.
///
/// The template sees `.ShortName`, `.LongName`, `.Kind`, `.Image` and an
/// `.Env` object holding every environment entry.
#[derive(Debug, Clone, Default)]
pub struct TemplateRenderer {
    fields: BTreeMap<&'static str, String>,
    env: BTreeMap<String, String>,
}

impl TemplateRenderer {
    pub fn for_node(spec: &NodeSpec) -> Self {
        let fields = BTreeMap::from([
            ("ShortName", spec.short_name.clone()),
            ("LongName", spec.long_name.clone()),
            ("Kind", spec.kind.clone()),
            ("Image", spec.image.clone()),
        ]);
        Self {
            fields,
            env: spec.env.clone(),
        }
    }

    fn context(&self) -> Value {
        let env = self
            .env
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect::<HashMap<_, _>>();
        let mut root: HashMap<String, Value> = self
            .fields
            .iter()
            .map(|(k, v)| ((*k).to_owned(), Value::String(v.clone())))
            .collect();
        root.insert("Env".to_owned(), Value::Object(env));
        Value::Object(root)
    }

    pub fn render(&self, template: &str) -> Result<String, RenderError> {
        gtmpl::template(template, self.context()).map_err(|e| RenderError::Template(e.to_string()))
    }
}

impl ConfigRenderer for TemplateRenderer {
    fn generate_config(&self, dest: &Path, template: &str) -> Result<(), RenderError> {
        let rendered = self.render(template)?;
        let dir = match dest.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(rendered.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(dest).map_err(|e| RenderError::Io(e.error))?;
        Ok(())
    }
}
