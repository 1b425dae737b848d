// ============================================================================
// GPU COMPUTE PIPELINES — displacement field, glass warp, box blur, color
// ============================================================================

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::COPY_BYTES_PER_ROW_ALIGNMENT;
use super::context::GpuContext;

// ============================================================================
// SHARED HELPERS
// ============================================================================

fn create_rw_texture(device: &wgpu::Device, w: u32, h: u32, label: &str) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: w,
            height: h,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::STORAGE_BINDING
            | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    })
}

fn upload_rgba(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    data: &[u8],
    w: u32,
    h: u32,
    label: &str,
) -> wgpu::Texture {
    let tex = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: w,
            height: h,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &tex,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        data,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(4 * w),
            rows_per_image: Some(h),
        },
        wgpu::Extent3d {
            width: w,
            height: h,
            depth_or_array_layers: 1,
        },
    );
    tex
}

/// Blocking texture readback: copy to a row-aligned staging buffer, map it,
/// strip the alignment padding. Returns `None` if the mapping fails.
fn readback_texture(ctx: &GpuContext, tex: &wgpu::Texture, w: u32, h: u32) -> Option<Vec<u8>> {
    let device = &ctx.device;
    let queue = &ctx.queue;

    let tight_bytes_per_row = w * 4;
    let padded_bytes_per_row =
        tight_bytes_per_row.div_ceil(COPY_BYTES_PER_ROW_ALIGNMENT) * COPY_BYTES_PER_ROW_ALIGNMENT;
    let buf_size = padded_bytes_per_row as u64 * h as u64;

    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("readback_staging"),
        size: buf_size,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("readback_encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::ImageCopyTexture {
            texture: tex,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::ImageCopyBuffer {
            buffer: &staging,
            layout: wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(padded_bytes_per_row),
                rows_per_image: Some(h),
            },
        },
        wgpu::Extent3d {
            width: w,
            height: h,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let slice = staging.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device.poll(wgpu::Maintain::Wait);
    match rx.recv() {
        Ok(Ok(())) => {}
        _ => {
            crate::log_err!("[GPU] texture readback map failed");
            return None;
        }
    }

    let mapped = slice.get_mapped_range();
    let mut result = Vec::with_capacity(tight_bytes_per_row as usize * h as usize);
    for row in 0..h as usize {
        let start = row * padded_bytes_per_row as usize;
        result.extend_from_slice(&mapped[start..start + tight_bytes_per_row as usize]);
    }
    drop(mapped);
    staging.unmap();

    Some(result)
}

/// Standard bind group layout used by the simple filters: input tex, output
/// storage tex, uniform buf.
fn filter_bgl(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::StorageTexture {
                    access: wgpu::StorageTextureAccess::WriteOnly,
                    format: wgpu::TextureFormat::Rgba8Unorm,
                    view_dimension: wgpu::TextureViewDimension::D2,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
    })
}

fn dispatch_simple_filter(
    ctx: &GpuContext,
    pipeline: &wgpu::ComputePipeline,
    bgl: &wgpu::BindGroupLayout,
    input_data: &[u8],
    w: u32,
    h: u32,
    params_bytes: &[u8],
) -> Option<Vec<u8>> {
    let device = &ctx.device;
    let queue = &ctx.queue;

    let src_tex = upload_rgba(device, queue, input_data, w, h, "filter_src");
    let dst_tex = create_rw_texture(device, w, h, "filter_dst");

    let params_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("filter_params"),
        contents: params_bytes,
        usage: wgpu::BufferUsages::UNIFORM,
    });

    let src_view = src_tex.create_view(&wgpu::TextureViewDescriptor::default());
    let dst_view = dst_tex.create_view(&wgpu::TextureViewDescriptor::default());

    let bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("filter_bg"),
        layout: bgl,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&src_view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&dst_view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: params_buf.as_entire_binding(),
            },
        ],
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("filter_encoder"),
    });
    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("filter_pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &bg, &[]);
        pass.dispatch_workgroups(w.div_ceil(16), h.div_ceil(16), 1);
    }
    queue.submit(std::iter::once(encoder.finish()));

    readback_texture(ctx, &dst_tex, w, h)
}

// ============================================================================
// DISPLACEMENT FIELD GENERATOR
// ============================================================================

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct FieldGpuParams {
    grid_w: u32,
    grid_h: u32,
    rect_w: f32,
    rect_h: f32,
    radius: f32,
    bezel: f32,
    magic: f32,
    rim: f32,
    noise: f32,
    _pad0: f32,
    _pad1: f32,
    _pad2: f32,
}

pub struct GpuFieldPipeline {
    pipeline: wgpu::ComputePipeline,
    bgl: wgpu::BindGroupLayout,
    cached_field_buf: Option<wgpu::Buffer>,
    cached_staging_buf: Option<wgpu::Buffer>,
    cached_w: u32,
    cached_h: u32,
}

impl GpuFieldPipeline {
    pub fn new(device: &wgpu::Device) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("displacement_field_shader"),
            source: wgpu::ShaderSource::Wgsl(super::shaders::DISPLACEMENT_FIELD_SHADER.into()),
        });

        let bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("field_bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("field_pl"),
            bind_group_layouts: &[&bgl],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("field_pipeline"),
            layout: Some(&layout),
            module: &shader,
            entry_point: "cs_displacement_field",
            compilation_options: Default::default(),
        });

        Self {
            pipeline,
            bgl,
            cached_field_buf: None,
            cached_staging_buf: None,
            cached_w: 0,
            cached_h: 0,
        }
    }

    fn ensure_cache(&mut self, device: &wgpu::Device, w: u32, h: u32) {
        if self.cached_w == w && self.cached_h == h {
            return;
        }
        let field_size = (w as usize * h as usize * 2 * std::mem::size_of::<f32>()) as u64;
        self.cached_field_buf = Some(device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("field_out"),
            size: field_size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        }));
        self.cached_staging_buf = Some(device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("field_staging"),
            size: field_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.cached_w = w;
        self.cached_h = h;
    }

    /// Generate the displacement field on the GPU and read it back.
    /// `params` must already be validated and clamped.
    pub fn generate(
        &mut self,
        ctx: &GpuContext,
        params: &crate::params::ShapeParams,
        w: u32,
        h: u32,
    ) -> Option<Vec<[f32; 2]>> {
        let device = &ctx.device;
        let queue = &ctx.queue;

        self.ensure_cache(device, w, h);
        let field_buf = self.cached_field_buf.as_ref()?;
        let staging = self.cached_staging_buf.as_ref()?;

        let gpu_params = FieldGpuParams {
            grid_w: w,
            grid_h: h,
            rect_w: params.width,
            rect_h: params.height,
            radius: params.radius,
            bezel: params.bezel,
            magic: params.magic,
            rim: params.rim,
            noise: params.noise,
            _pad0: 0.0,
            _pad1: 0.0,
            _pad2: 0.0,
        };
        let params_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("field_params"),
            contents: bytemuck::bytes_of(&gpu_params),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("field_bg"),
            layout: &self.bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: field_buf.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: params_buf.as_entire_binding(),
                },
            ],
        });

        let field_byte_size = (w as usize * h as usize * 2 * std::mem::size_of::<f32>()) as u64;

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("field_encoder"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("field_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bg, &[]);
            pass.dispatch_workgroups(w.div_ceil(16), h.div_ceil(16), 1);
        }
        encoder.copy_buffer_to_buffer(field_buf, 0, staging, 0, field_byte_size);
        queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..field_byte_size);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device.poll(wgpu::Maintain::Wait);
        match rx.recv() {
            Ok(Ok(())) => {}
            _ => {
                crate::log_err!("[GPU] displacement field readback failed");
                return None;
            }
        }

        let mapped = slice.get_mapped_range();
        let pairs: &[[f32; 2]] = bytemuck::cast_slice(&mapped);
        let out = pairs[..w as usize * h as usize].to_vec();
        drop(mapped);
        staging.unmap();

        Some(out)
    }
}

// ============================================================================
// GLASS WARP
// ============================================================================

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct WarpGpuParams {
    out_w: u32,
    out_h: u32,
    field_w: u32,
    field_h: u32,
    scale: f32,
    padding: f32,
    aberration: f32,
    blend_px: f32,
}

pub struct GpuWarpPipeline {
    pipeline: wgpu::ComputePipeline,
    bgl: wgpu::BindGroupLayout,
}

impl GpuWarpPipeline {
    pub fn new(device: &wgpu::Device) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("glass_warp_shader"),
            source: wgpu::ShaderSource::Wgsl(super::shaders::GLASS_WARP_SHADER.into()),
        });

        let bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("warp_bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: wgpu::TextureFormat::Rgba8Unorm,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("warp_pl"),
            bind_group_layouts: &[&bgl],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("warp_pipeline"),
            layout: Some(&layout),
            module: &shader,
            entry_point: "cs_glass_warp",
            compilation_options: Default::default(),
        });

        Self { pipeline, bgl }
    }

    /// Warp `src` (packed RGBA, `out_w x out_h`) through the field.
    #[allow(clippy::too_many_arguments)]
    pub fn apply(
        &self,
        ctx: &GpuContext,
        src: &[u8],
        out_w: u32,
        out_h: u32,
        field: &[[f32; 2]],
        field_w: u32,
        field_h: u32,
        scale: f32,
        padding: f32,
        aberration: f32,
        blend_px: f32,
    ) -> Option<Vec<u8>> {
        let device = &ctx.device;
        let queue = &ctx.queue;

        let src_tex = upload_rgba(device, queue, src, out_w, out_h, "warp_src");
        let dst_tex = create_rw_texture(device, out_w, out_h, "warp_dst");

        let field_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("warp_field"),
            contents: bytemuck::cast_slice(field),
            usage: wgpu::BufferUsages::STORAGE,
        });

        let gpu_params = WarpGpuParams {
            out_w,
            out_h,
            field_w,
            field_h,
            scale,
            padding,
            aberration,
            blend_px,
        };
        let params_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("warp_params"),
            contents: bytemuck::bytes_of(&gpu_params),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let src_view = src_tex.create_view(&wgpu::TextureViewDescriptor::default());
        let dst_view = dst_tex.create_view(&wgpu::TextureViewDescriptor::default());

        let bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("warp_bg"),
            layout: &self.bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&src_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&dst_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: field_buf.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: params_buf.as_entire_binding(),
                },
            ],
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("warp_encoder"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("warp_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bg, &[]);
            pass.dispatch_workgroups(out_w.div_ceil(16), out_h.div_ceil(16), 1);
        }
        queue.submit(std::iter::once(encoder.finish()));

        readback_texture(ctx, &dst_tex, out_w, out_h)
    }
}

// ============================================================================
// BOX BLUR
// ============================================================================

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct BlurGpuParams {
    width: u32,
    height: u32,
    radius: u32,
    direction: u32,
}

pub struct GpuBoxBlurPipeline {
    pipeline: wgpu::ComputePipeline,
    bgl: wgpu::BindGroupLayout,
}

impl GpuBoxBlurPipeline {
    pub fn new(device: &wgpu::Device) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("box_blur_shader"),
            source: wgpu::ShaderSource::Wgsl(super::shaders::BOX_BLUR_SHADER.into()),
        });
        let bgl = filter_bgl(device, "box_blur_bgl");
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("box_blur_pl"),
            bind_group_layouts: &[&bgl],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("box_blur_pipeline"),
            layout: Some(&layout),
            module: &shader,
            entry_point: "cs_box_blur",
            compilation_options: Default::default(),
        });
        Self { pipeline, bgl }
    }

    /// Two-pass separable box blur on packed RGBA data.
    pub fn apply(
        &self,
        ctx: &GpuContext,
        data: &[u8],
        w: u32,
        h: u32,
        radius: u32,
    ) -> Option<Vec<u8>> {
        if radius == 0 {
            return Some(data.to_vec());
        }
        let device = &ctx.device;
        let queue = &ctx.queue;

        let src_tex = upload_rgba(device, queue, data, w, h, "blur_src");
        let temp_tex = create_rw_texture(device, w, h, "blur_temp");
        let dst_tex = create_rw_texture(device, w, h, "blur_dst");

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("blur_encoder"),
        });

        for (direction, input, output) in [(0u32, &src_tex, &temp_tex), (1u32, &temp_tex, &dst_tex)]
        {
            let params = BlurGpuParams {
                width: w,
                height: h,
                radius,
                direction,
            };
            let params_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("blur_params"),
                contents: bytemuck::bytes_of(&params),
                usage: wgpu::BufferUsages::UNIFORM,
            });

            let in_view = input.create_view(&wgpu::TextureViewDescriptor::default());
            let out_view = output.create_view(&wgpu::TextureViewDescriptor::default());

            let bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("blur_bg"),
                layout: &self.bgl,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&in_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&out_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: params_buf.as_entire_binding(),
                    },
                ],
            });

            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("blur_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bg, &[]);
            pass.dispatch_workgroups(w.div_ceil(16), h.div_ceil(16), 1);
        }
        queue.submit(std::iter::once(encoder.finish()));

        readback_texture(ctx, &dst_tex, w, h)
    }
}

// ============================================================================
// COLOR CONTROLS
// ============================================================================

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct ColorGpuParams {
    width: u32,
    height: u32,
    brightness: f32,
    saturation: f32,
    contrast: f32,
    _pad0: f32,
    _pad1: f32,
    _pad2: f32,
}

pub struct GpuColorControlsPipeline {
    pipeline: wgpu::ComputePipeline,
    bgl: wgpu::BindGroupLayout,
}

impl GpuColorControlsPipeline {
    pub fn new(device: &wgpu::Device) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("color_controls_shader"),
            source: wgpu::ShaderSource::Wgsl(super::shaders::COLOR_CONTROLS_SHADER.into()),
        });
        let bgl = filter_bgl(device, "color_bgl");
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("color_pl"),
            bind_group_layouts: &[&bgl],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("color_pipeline"),
            layout: Some(&layout),
            module: &shader,
            entry_point: "cs_color_controls",
            compilation_options: Default::default(),
        });
        Self { pipeline, bgl }
    }

    pub fn apply(
        &self,
        ctx: &GpuContext,
        data: &[u8],
        w: u32,
        h: u32,
        brightness: f32,
        saturation: f32,
        contrast: f32,
    ) -> Option<Vec<u8>> {
        let params = ColorGpuParams {
            width: w,
            height: h,
            brightness,
            saturation,
            contrast,
            _pad0: 0.0,
            _pad1: 0.0,
            _pad2: 0.0,
        };
        dispatch_simple_filter(
            ctx,
            &self.pipeline,
            &self.bgl,
            data,
            w,
            h,
            bytemuck::bytes_of(&params),
        )
    }
}
