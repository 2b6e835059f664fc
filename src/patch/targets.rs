//! Host methods the initializer patches or looks for, and the hook methods
//! it exposes in their place.
//!
//! All of these are fixed by the host's public surface. Rewriting its
//! loader against a different host version means updating this file and
//! [`CANDIDATE_LOCAL_SLOT`](super::CANDIDATE_LOCAL_SLOT).

use crate::core::TypeName;

use super::il::MethodRef;

/// Namespace of the host's bootstrap types.
pub const HOST_BOOTSTRAP_NAMESPACE: &str = "BepInEx.Bootstrap";

/// Namespace of the host's public types.
pub const HOST_NAMESPACE: &str = "BepInEx";

/// Type declaring the initializer's hook methods.
pub const HOOK_TYPE: &str = "Abyss.Initializer";

fn chainloader() -> TypeName {
    TypeName::new(HOST_BOOTSTRAP_NAMESPACE, "Chainloader")
}

/// The host's plugin-entry type.
pub fn plugin_info() -> TypeName {
    TypeName::new(HOST_NAMESPACE, "PluginInfo")
}

/// The host's plugin base type.
pub fn plugin_base() -> TypeName {
    TypeName::new(HOST_NAMESPACE, "BaseUnityPlugin")
}

/// `Chainloader.Initialize`, which must finish before `Start` is patchable.
pub fn chainloader_initialize() -> MethodRef {
    MethodRef::new(chainloader(), "Initialize")
}

/// `Chainloader.Start`, the routine whose body gets rewritten.
pub fn chainloader_start() -> MethodRef {
    MethodRef::new(chainloader(), "Start")
}

/// The discovery lookup, instantiated for the plugin-entry type.
pub fn find_plugin_types() -> MethodRef {
    MethodRef::new(TypeName::new(HOST_BOOTSTRAP_NAMESPACE, "TypeLoader"), "FindPluginTypes")
        .with_generic_arg(plugin_info())
}

/// The setter that marks a plugin entry active.
pub fn plugin_instance_setter() -> MethodRef {
    MethodRef::property_setter(plugin_info(), "Instance")
}

fn hook(name: &str) -> MethodRef {
    let (namespace, ty) = HOOK_TYPE.rsplit_once('.').unwrap_or(("", HOOK_TYPE));
    MethodRef::new(TypeName::new(namespace, ty), name)
}

/// Postfix on `Chainloader.Initialize` that installs the rewrite.
pub fn initialized_hook() -> MethodRef {
    hook("OnChainloaderInitialized")
}

/// Called with the discovery result; returns the augmented result.
pub fn discovery_hook() -> MethodRef {
    hook("OnPluginsDiscovered")
}

/// Called with a plugin entry right after it has been activated.
pub fn activation_hook() -> MethodRef {
    hook("OnPluginActivated")
}
