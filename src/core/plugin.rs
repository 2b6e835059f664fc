//! Plugin entries - loadable units discovered inside a module.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::module::TypeName;

/// Optional late-initialization capability.
///
/// Plugin instances that implement this receive a call right after the
/// host marks them active. Nothing else is required of them.
pub trait LateInitializable {
    /// Called once, after the host has set the plugin's instance.
    fn init_dredge_mod(&mut self);
}

/// A live plugin instance, as created by the host.
pub trait PluginInstance {
    /// Name of the concrete runtime type.
    fn type_name(&self) -> &str;

    /// Expose the late-initialization capability, if the instance has one.
    fn as_late_initializable(&mut self) -> Option<&mut dyn LateInitializable> {
        None
    }
}

/// Activation state of a plugin entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activation {
    #[default]
    Inactive,
    Active,
}

/// A discovered loadable unit inside a module.
pub struct PluginEntry {
    /// Type the entry was discovered from
    type_name: TypeName,

    /// Module the type lives in
    location: PathBuf,

    /// Instance set by the host on activation
    instance: Option<Box<dyn PluginInstance>>,
}

impl PluginEntry {
    /// Create an inactive entry for `type_name` in the module at `location`.
    pub fn new(type_name: TypeName, location: impl Into<PathBuf>) -> Self {
        PluginEntry {
            type_name,
            location: location.into(),
            instance: None,
        }
    }

    /// Get the identity of the entry (its type's full name).
    pub fn id(&self) -> String {
        self.type_name.full_name()
    }

    pub fn type_name(&self) -> &TypeName {
        &self.type_name
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn activation(&self) -> Activation {
        if self.instance.is_some() {
            Activation::Active
        } else {
            Activation::Inactive
        }
    }

    /// Set the instance, marking the entry active.
    pub fn set_instance(&mut self, instance: Box<dyn PluginInstance>) {
        self.instance = Some(instance);
    }

    pub fn instance_mut(&mut self) -> Option<&mut (dyn PluginInstance + 'static)> {
        self.instance.as_deref_mut()
    }
}

impl fmt::Debug for PluginEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginEntry")
            .field("type_name", &self.type_name)
            .field("location", &self.location)
            .field("activation", &self.activation())
            .finish()
    }
}
