// ============================================================================
// GPU CONTEXT — wgpu Device, Queue, and adapter initialization
// ============================================================================

use std::sync::{Arc, OnceLock};

/// Holds the core wgpu resources shared across the process.
/// Created once on first use; if creation fails the failure is cached and
/// every later request returns `None` without retrying.
pub struct GpuContext {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    pub adapter_name: String,
    /// Maximum texture dimension supported by this device.
    pub max_texture_dim: u32,
}

static CONTEXT: OnceLock<Option<Arc<GpuContext>>> = OnceLock::new();

impl GpuContext {
    /// Process-wide context, initialised on first call. The init attempt —
    /// success or failure — happens exactly once per process lifetime.
    pub fn global() -> Option<Arc<GpuContext>> {
        CONTEXT
            .get_or_init(|| match Self::new() {
                Some(ctx) => {
                    crate::log_info!("[GPU] compute backend ready ({})", ctx.adapter_name);
                    Some(Arc::new(ctx))
                }
                None => {
                    crate::log_err!("[GPU] no usable adapter — compute backend unavailable");
                    None
                }
            })
            .clone()
    }

    /// Attempt to create a GPU context.  Tries hardware first, then falls
    /// back to a software rasterizer (`force_fallback_adapter`) so compute
    /// still works on machines without a real GPU.
    ///
    /// `pollster::block_on` keeps init synchronous; the rest of the crate
    /// never awaits.
    pub fn new() -> Option<Self> {
        // 1. Try hardware adapter.
        if let Some(ctx) = pollster::block_on(Self::new_async(false)) {
            return Some(ctx);
        }
        // 2. Fallback: software rasterizer.
        eprintln!("[GPU] Hardware adapter unavailable — trying software fallback");
        pollster::block_on(Self::new_async(true))
    }

    async fn new_async(force_fallback: bool) -> Option<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None, // headless — compute only
                force_fallback_adapter: force_fallback,
            })
            .await?;

        let adapter_name = adapter.get_info().name.clone();
        let limits = adapter.limits();

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("liquidglass GPU"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits {
                        max_texture_dimension_2d: limits.max_texture_dimension_2d,
                        max_storage_buffer_binding_size: limits.max_storage_buffer_binding_size,
                        max_compute_workgroup_size_x: limits.max_compute_workgroup_size_x,
                        max_compute_workgroup_size_y: limits.max_compute_workgroup_size_y,
                        max_compute_workgroup_size_z: limits.max_compute_workgroup_size_z,
                        max_compute_workgroups_per_dimension: limits
                            .max_compute_workgroups_per_dimension,
                        ..wgpu::Limits::downlevel_defaults()
                    },
                },
                None,
            )
            .await
            .ok()?;

        Some(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            adapter_name,
            max_texture_dim: limits.max_texture_dimension_2d,
        })
    }

    /// Check if a texture of the given dimensions can be created.
    pub fn supports_size(&self, width: u32, height: u32) -> bool {
        width <= self.max_texture_dim && height <= self.max_texture_dim
    }
}
