//! WGSL programs compiled into the binary, cached by program name.

use std::collections::HashMap;
use std::sync::Arc;

use crate::pipeline::CLIPMAP_SHADER_SOURCE;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShaderError {
    #[error("no embedded WGSL for program '{name}'")]
    UnknownShader { name: String },
}

/// WGSL source for a program name, if one is embedded.
pub fn embedded_source(name: &str) -> Option<&'static str> {
    (name == horizon_clipmap::PROGRAM_NAME).then_some(CLIPMAP_SHADER_SOURCE)
}

/// Compiled shader modules keyed by program name. Each program is compiled at
/// most once per device.
#[derive(Default)]
pub struct ShaderLibrary {
    modules: HashMap<String, Arc<wgpu::ShaderModule>>,
}

impl ShaderLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Module for `name`, compiling the embedded source on first request.
    pub fn load_embedded(
        &mut self,
        device: &wgpu::Device,
        name: &str,
    ) -> Result<Arc<wgpu::ShaderModule>, ShaderError> {
        if let Some(module) = self.modules.get(name) {
            return Ok(Arc::clone(module));
        }

        let source = embedded_source(name).ok_or_else(|| ShaderError::UnknownShader {
            name: name.to_owned(),
        })?;
        let module = Arc::new(device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(name),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        }));
        log::debug!("Compiled WGSL for program '{}' ({} bytes)", name, source.len());

        self.modules.insert(name.to_owned(), Arc::clone(&module));
        Ok(module)
    }

    /// Already-compiled module for `name`.
    pub fn get(&self, name: &str) -> Option<Arc<wgpu::ShaderModule>> {
        self.modules.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headless_device() -> Option<wgpu::Device> {
        let ctx = crate::gpu::init_gpu_context_blocking().ok()?;
        Some(ctx.device)
    }

    #[test]
    fn test_only_the_clipmap_program_is_embedded() {
        assert_eq!(embedded_source("clipmap"), Some(CLIPMAP_SHADER_SOURCE));
        assert!(embedded_source("water").is_none());
    }

    #[test]
    fn test_empty_library_has_nothing_compiled() {
        let library = ShaderLibrary::new();
        assert!(library.is_empty());
        assert!(library.get("clipmap").is_none());
    }

    #[test]
    fn test_program_compiles_once() {
        let Some(device) = headless_device() else {
            return;
        };
        let mut library = ShaderLibrary::new();
        let first = library.load_embedded(&device, "clipmap").unwrap();
        let second = library.load_embedded(&device, "clipmap").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(library.len(), 1);
        assert!(library.get("clipmap").is_some());
    }

    #[test]
    fn test_unknown_program_is_rejected() {
        let Some(device) = headless_device() else {
            return;
        };
        let mut library = ShaderLibrary::new();
        assert_eq!(
            library.load_embedded(&device, "water").err(),
            Some(ShaderError::UnknownShader {
                name: "water".to_owned()
            })
        );
        assert!(library.is_empty());
    }
}
