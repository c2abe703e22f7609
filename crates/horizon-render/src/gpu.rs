//! Headless GPU device initialization.
//!
//! [`GpuContext`] owns the wgpu instance, adapter, device and queue. No surface
//! is created; callers render into their own targets.

#[derive(Debug, thiserror::Error)]
pub enum GpuContextError {
    #[error("no GPU adapter available for offscreen rendering: {0}")]
    NoAdapter(#[source] wgpu::RequestAdapterError),

    #[error("GPU device request rejected: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),
}

/// Limits the clipmap needs. Downlevel limits keep software adapters usable.
pub fn required_limits() -> wgpu::Limits {
    wgpu::Limits::downlevel_defaults()
}

/// Instance, adapter, device and queue for offscreen clipmap drawing.
pub struct GpuContext {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl GpuContext {
    /// Create a headless device.
    ///
    /// Line rasterization is requested when the adapter offers it, so that
    /// wireframe drawing can use it.
    pub async fn new() -> Result<Self, GpuContextError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(GpuContextError::NoAdapter)?;

        let info = adapter.get_info();
        log::info!(
            "Clipmap adapter: {} on {:?} ({:?})",
            info.name,
            info.backend,
            info.device_type
        );

        let required_features = optional_features(adapter.features());
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("horizon-device"),
                required_features,
                required_limits: required_limits(),
                memory_hints: wgpu::MemoryHints::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
        })
    }

    /// Whether the device can rasterize polygons as lines.
    pub fn supports_wireframe(&self) -> bool {
        self.device
            .features()
            .contains(wgpu::Features::POLYGON_MODE_LINE)
    }
}

/// [`GpuContext::new`] driven to completion on the current thread.
pub fn init_gpu_context_blocking() -> Result<GpuContext, GpuContextError> {
    pollster::block_on(GpuContext::new())
}

/// Features to request from an adapter offering `available`.
fn optional_features(available: wgpu::Features) -> wgpu::Features {
    available & wgpu::Features::POLYGON_MODE_LINE
}
