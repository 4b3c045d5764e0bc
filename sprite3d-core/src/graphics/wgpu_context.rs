use std::num::NonZeroU64;
use std::sync::Arc;

use bytemuck_derive::{Pod, Zeroable};
use glam::{Affine2, Mat4};
use image::RgbaImage;
use wgpu::{
    BindGroup, BindGroupLayout, BufferUsages, CommandEncoder, Device, PipelineLayout, Queue,
    RenderPipeline, ShaderModule, TextureFormat, TextureView,
};

use crate::error::RenderError;
use crate::utils::*;

use super::context::{
    AttributeFormat, BlendMode, BufferHandle, BufferTarget, BufferUsage, GraphicsContext,
    IndexFormat, ProgramHandle, TextureHandle, VertexAttribute,
};
use super::dynamic_buffer::DynamicBuffer;
use super::projection::screen_projection;
use super::shader::{ShaderSource, PROJECTION_UNIFORM};
use super::texture::{TextureId, TextureManager};
use super::texture_bundle::TextureBundle;

pub const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

/// Offsets into vertex, index and uniform buffers are kept on this boundary.
const BUFFER_ALIGNMENT: u64 = 256;

const fn align_to(value: u64, alignment: u64) -> u64 {
    value.div_ceil(alignment) * alignment
}


/// One projection matrix, padded to the uniform offset alignment.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct MatrixSlot {
    matrix: [f32; 16],
    _padding: [f32; 48],
}
const MATRIX_SLOT_SIZE: u64 = std::mem::size_of::<MatrixSlot>() as u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PipelineKey {
    program: ProgramHandle,
    blend_mode: BlendMode,
    depth_test: bool,
}

/// Everything a recorded draw needs to be replayed inside a render pass.
#[derive(Debug, Clone, Copy)]
struct DrawRecord {
    pipeline: PipelineKey,
    vertex_buffer: BufferHandle,
    vertex_base: u64,
    index_buffer: BufferHandle,
    index_base: u64,
    texture: TextureHandle,
    matrix_slot: u32,
    first_index: u32,
    count: u32,
}

/// Where the current contents of a [`GpuBuffer`] live inside its wgpu buffer.
///
/// wgpu applies every queued write before the frame's commands run, so once a
/// recorded draw reads the current range the next upload moves to a fresh
/// range further into the buffer. The bytes the GPU already has are carried
/// over with a buffer-to-buffer copy, only the uploaded bytes are written.
#[derive(Debug, Clone, PartialEq)]
struct BufferRange {
    /// Start of the current contents.
    base: u64,
    /// End of everything draws may read this frame.
    end: u64,
    /// Leading bytes of the contents the GPU has a copy of.
    valid: u64,
    read: bool,
    /// Move back to offset 0 on the next upload.
    rewind: bool,
}

/// What one upload has to do on the GPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct UploadPlan {
    /// `(from, to, len)` in bytes, submitted before the write.
    copy: Option<(u64, u64, u64)>,
    /// Byte range of the contents to write.
    write: (u64, u64),
    /// Where `write.0` lands in the buffer.
    write_at: u64,
}

impl BufferRange {
    fn new(len: u64) -> Self {
        Self {
            base: 0,
            end: len,
            valid: len,
            read: false,
            rewind: false,
        }
    }

    /// Plans writing `[offset, offset + len)` of the contents, which are `capacity` bytes.
    fn plan_upload(&mut self, offset: u64, len: u64, capacity: u64) -> UploadPlan {
        let mut copy = None;
        if self.read || self.rewind {
            let target = match self.read {
                true => align_to(self.end, BUFFER_ALIGNMENT),
                false => 0,
            };
            if self.valid > 0 {
                copy = Some((self.base, target, self.valid));
            }
            if !self.read {
                self.end = 0;
            }
            self.base = target;
            self.read = false;
            self.rewind = false;
        }

        let from = offset / 4 * 4;
        let to = align_to(offset + len, 4).min(capacity);
        self.valid = self.valid.max(to);
        self.end = self.end.max(self.base + self.valid);
        UploadPlan {
            copy,
            write: (from, to),
            write_at: self.base + from,
        }
    }

    fn end_frame(&mut self) {
        self.rewind = self.base != 0;
        self.end = self.base + self.valid;
        self.read = false;
    }
}


/// A buffer as the renderer sees it: one contiguous byte range that uploads
/// overwrite in place.
#[derive(Debug)]
struct GpuBuffer {
    data: DynamicBuffer<u8>,
    shadow: Vec<u8>,
    range: BufferRange,
}
impl GpuBuffer {
    fn upload(&mut self, device: &Device, queue: &Queue, offset: u64, data: &[u8]) {
        let start = offset as usize;
        self.shadow[start..start + data.len()].copy_from_slice(data);

        let plan = self.range.plan_upload(offset, data.len() as u64, self.shadow.len() as u64);
        if let Some((from, to, len)) = plan.copy {
            self.data.copy_within(device, queue, from, to, len);
        }
        let (from, to) = plan.write;
        self.data.write(device, queue, plan.write_at as usize, &self.shadow[from as usize..to as usize]);
    }
}


/// [`GraphicsContext`] on top of a wgpu device.
///
/// Calls are recorded as draws and replayed into a render pass by
/// [`encode`](WgpuContext::encode), once per frame.
pub struct WgpuContext {
    device: Arc<Device>,
    queue: Arc<Queue>,
    format: TextureFormat,

    uniform_layout: BindGroupLayout,
    texture_layout: BindGroupLayout,
    pipeline_layout: PipelineLayout,

    buffers: HashMap<BufferHandle, GpuBuffer>,
    programs: HashMap<ProgramHandle, ShaderModule>,
    pipelines: HashMap<PipelineKey, RenderPipeline>,
    textures: HashMap<TextureHandle, (TextureBundle, BindGroup)>,
    next_handle: u32,

    matrices: DynamicBuffer<MatrixSlot>,
    matrix_count: u32,
    program_matrices: HashMap<ProgramHandle, u32>,
    uniform_bind_group: BindGroup,

    // bound state
    bound_buffers: HashMap<BufferTarget, BufferHandle>,
    attributes: Vec<wgpu::VertexAttribute>,
    vertex_stride: u64,
    program: Option<ProgramHandle>,
    texture: Option<TextureHandle>,
    blend_mode: Option<BlendMode>,
    depth_test: bool,
    projection: Affine2,

    draws: Vec<DrawRecord>,
}
impl WgpuContext {
    /// Creates a context drawing into targets of `format`, sized `width` x `height`.
    pub fn new(device: Arc<Device>, queue: Arc<Queue>, format: TextureFormat, width: u32, height: u32) -> Self {
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Sprite3d uniform layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(64),
                },
                count: None,
            }],
        });
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Sprite3d texture layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Sprite3d pipeline layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            push_constant_ranges: &[],
        });
        let matrices = DynamicBuffer::with_capacity("Projection matrices", &device, BufferUsages::UNIFORM, 16);
        let uniform_bind_group = uniform_bind_group(&device, &uniform_layout, &matrices);

        Self {
            format,
            uniform_layout,
            texture_layout,
            pipeline_layout,
            buffers: HashMap::default(),
            programs: HashMap::default(),
            pipelines: HashMap::default(),
            textures: HashMap::default(),
            next_handle: 1,
            matrices,
            matrix_count: 0,
            program_matrices: HashMap::default(),
            uniform_bind_group,
            bound_buffers: HashMap::default(),
            attributes: Vec::with_capacity(3),
            vertex_stride: 0,
            program: None,
            texture: None,
            blend_mode: None,
            depth_test: false,
            projection: screen_projection(width.max(1) as f32, height.max(1) as f32),
            draws: Vec::new(),
            device,
            queue,
        }
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Draws recorded since the last [`encode`](Self::encode).
    pub fn pending_draws(&self) -> usize {
        self.draws.len()
    }

    /// Follows a resized render target.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.projection = screen_projection(width.max(1) as f32, height.max(1) as f32);
    }

    /// A depth attachment matching a `width` x `height` target.
    pub fn create_depth_view(device: &Device, width: u32, height: u32) -> TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Sprite3d depth texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    /// Uploads `image` and leaves the new texture bound.
    pub fn create_texture(&mut self, label: &str, image: &RgbaImage) -> TextureHandle {
        let bundle = TextureBundle::from_rgba(&self.device, &self.queue, label, image.width(), image.height(), image.as_raw());
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(bundle.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(bundle.sampler()),
                },
            ],
        });
        let handle = TextureHandle(self.next_handle());
        trace!("Created texture '{label}' ({}x{}) as {handle:?}", bundle.width(), bundle.height());
        self.textures.insert(handle, (bundle, bind_group));
        self.bind_texture(handle);
        handle
    }

    pub fn delete_texture(&mut self, texture: TextureHandle) {
        self.textures.remove(&texture);
        if self.texture == Some(texture) {
            self.texture = None;
        }
    }

    /// Replays the recorded draws into one render pass on `target` and starts
    /// a new recording. `clear` also clears the depth attachment.
    pub fn encode(&mut self, encoder: &mut CommandEncoder, target: &TextureView, depth: &TextureView, clear: Option<wgpu::Color>) {
        #[cfg(feature = "trace")]
        let _span = info_span!("WgpuContext::encode").entered();

        let mut keys: Vec<PipelineKey> = self.draws.iter().map(|d| d.pipeline).collect();
        keys.dedup();
        for key in keys {
            self.ensure_pipeline(key);
        }
        if self.matrices.dirty() {
            self.uniform_bind_group = uniform_bind_group(&self.device, &self.uniform_layout, &self.matrices);
            self.matrices.mark_clean();
        }

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Sprite3d render pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: match clear {
                            Some(color) => wgpu::LoadOp::Clear(color),
                            None => wgpu::LoadOp::Load,
                        },
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth,
                    depth_ops: Some(wgpu::Operations {
                        load: match clear {
                            Some(_) => wgpu::LoadOp::Clear(1.0),
                            None => wgpu::LoadOp::Load,
                        },
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for draw in &self.draws {
                let (Some(pipeline), Some(vertices), Some(indices), Some((_, texture))) = (
                    self.pipelines.get(&draw.pipeline),
                    self.buffers.get(&draw.vertex_buffer),
                    self.buffers.get(&draw.index_buffer),
                    self.textures.get(&draw.texture),
                ) else {
                    warn!("Skipping draw of {} indices, a resource was deleted", draw.count);
                    continue;
                };

                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, &self.uniform_bind_group, &[(draw.matrix_slot as u64 * MATRIX_SLOT_SIZE) as u32]);
                pass.set_bind_group(1, texture, &[]);
                pass.set_vertex_buffer(0, vertices.data.buffer().slice(draw.vertex_base..));
                pass.set_index_buffer(indices.data.buffer().slice(draw.index_base..), wgpu::IndexFormat::Uint16);
                pass.draw_indexed(draw.first_index..draw.first_index + draw.count, 0, 0..1);
            }
        }

        self.draws.clear();
        self.matrix_count = 0;
        self.program_matrices.clear();
        self.buffers.values_mut().for_each(|buffer| buffer.range.end_frame());
    }

    fn next_handle(&mut self) -> u32 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    fn ensure_pipeline(&mut self, key: PipelineKey) {
        if self.pipelines.contains_key(&key) {
            return;
        }
        let Some(module) = self.programs.get(&key.program) else {
            warn!("No shader module for {:?}", key.program);
            return;
        };

        let depth_compare = match key.depth_test {
            true => wgpu::CompareFunction::LessEqual,
            false => wgpu::CompareFunction::Always,
        };
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Sprite3d pipeline"),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module,
                entry_point: "vs_main",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: self.vertex_stride,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &self.attributes,
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.format,
                    blend: Some(blend_state(key.blend_mode)),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: key.depth_test,
                depth_compare,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        if let Some(e) = pollster::block_on(self.device.pop_error_scope()) {
            error!("Failed to create pipeline for {key:?}: {e}");
            return;
        }
        debug!("Created pipeline {key:?}");
        self.pipelines.insert(key, pipeline);
    }
}

impl GraphicsContext for WgpuContext {
    /// The device is never lost without the context being recreated.
    fn generation(&self) -> u32 {
        0
    }

    fn create_buffer(&mut self, target: BufferTarget, contents: &[u8], usage: BufferUsage) -> Result<BufferHandle, RenderError> {
        if contents.is_empty() {
            return Err(RenderError::BufferCreation {
                target,
                len: 0,
                reason: "buffers must not be empty".to_owned(),
            });
        }
        let usages = match target {
            BufferTarget::Vertex => BufferUsages::VERTEX,
            BufferTarget::Index => BufferUsages::INDEX,
        };
        let mut shadow = contents.to_vec();
        shadow.resize(align_to(contents.len() as u64, 4) as usize, 0);

        let label = format!("{target:?} buffer ({usage:?})");
        let mut data = DynamicBuffer::with_capacity(&label, &self.device, usages, shadow.len());
        data.write(&self.device, &self.queue, 0, &shadow);

        let buffer = BufferHandle(self.next_handle());
        self.buffers.insert(buffer, GpuBuffer {
            data,
            range: BufferRange::new(shadow.len() as u64),
            shadow,
        });
        self.bound_buffers.insert(target, buffer);
        Ok(buffer)
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: BufferHandle) {
        self.bound_buffers.insert(target, buffer);
    }

    fn upload_buffer(&mut self, target: BufferTarget, offset: u64, data: &[u8]) {
        let Some(buffer) = self
            .bound_buffers
            .get(&target)
            .and_then(|handle| self.buffers.get_mut(handle))
        else {
            warn!("Upload to {target:?} without a bound buffer");
            return;
        };
        if offset as usize + data.len() > buffer.shadow.len() {
            warn!("Upload of {} bytes at {offset} overflows a {} byte buffer", data.len(), buffer.shadow.len());
            return;
        }
        buffer.upload(&self.device, &self.queue, offset, data);
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        self.buffers.remove(&buffer);
        self.bound_buffers.retain(|_, bound| *bound != buffer);
    }

    fn vertex_attribute(&mut self, attribute: VertexAttribute) {
        let format = vertex_format(attribute.format);
        let wgpu_attribute = wgpu::VertexAttribute {
            format,
            offset: attribute.offset,
            shader_location: attribute.location,
        };
        if self.attributes.contains(&wgpu_attribute) && self.vertex_stride == attribute.stride {
            return;
        }

        self.attributes.retain(|a| a.shader_location != attribute.location);
        self.attributes.push(wgpu_attribute);
        self.vertex_stride = attribute.stride;
        // the vertex layout is baked into every pipeline
        self.pipelines.clear();
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.depth_test = enabled;
    }

    fn active_texture(&mut self, unit: u32) {
        if unit != 0 {
            warn!("Only texture unit 0 is supported, got {unit}");
        }
    }

    fn blend_mode(&self) -> Option<BlendMode> {
        self.blend_mode
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.blend_mode = Some(mode);
    }

    fn create_program(&mut self, source: &ShaderSource) -> Result<ProgramHandle, RenderError> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(source.label()),
            source: wgpu::ShaderSource::Wgsl(source.wgsl().into()),
        });
        if let Some(e) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(RenderError::ProgramCreation {
                label: source.label().to_owned(),
                reason: e.to_string(),
            });
        }

        let program = ProgramHandle(self.next_handle());
        self.programs.insert(program, module);
        Ok(program)
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.program = Some(program);
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        self.programs.remove(&program);
        self.pipelines.retain(|key, _| key.program != program);
        if self.program == Some(program) {
            self.program = None;
        }
    }

    fn upload_matrix4(&mut self, program: ProgramHandle, name: &str, matrix: &Mat4) {
        if name != PROJECTION_UNIFORM {
            warn!("Unknown uniform '{name}'");
            return;
        }
        let slot = self.matrix_count;
        self.matrices.write(&self.device, &self.queue, slot as usize, &[MatrixSlot {
            matrix: matrix.to_cols_array(),
            _padding: [0.0; 48],
        }]);
        self.matrix_count += 1;
        self.program_matrices.insert(program, slot);
    }

    fn bind_texture(&mut self, texture: TextureHandle) {
        self.texture = Some(texture);
    }

    fn draw_elements(&mut self, count: u32, format: IndexFormat, byte_offset: u64) {
        let (Some(program), Some(texture)) = (self.program, self.texture) else {
            warn!("Draw without a program or texture bound");
            return;
        };
        let (Some(&vertex_buffer), Some(&index_buffer)) = (
            self.bound_buffers.get(&BufferTarget::Vertex),
            self.bound_buffers.get(&BufferTarget::Index),
        ) else {
            warn!("Draw without vertex and index buffers bound");
            return;
        };
        let Some(&matrix_slot) = self.program_matrices.get(&program) else {
            warn!("Draw with {program:?} before its projection was uploaded");
            return;
        };

        let vertex_base = match self.buffers.get_mut(&vertex_buffer) {
            Some(buffer) => {
                buffer.range.read = true;
                buffer.range.base
            }
            None => return,
        };
        let index_base = match self.buffers.get_mut(&index_buffer) {
            Some(buffer) => {
                buffer.range.read = true;
                buffer.range.base
            }
            None => return,
        };

        self.draws.push(DrawRecord {
            pipeline: PipelineKey {
                program,
                blend_mode: self.blend_mode.unwrap_or_default(),
                depth_test: self.depth_test,
            },
            vertex_buffer,
            vertex_base,
            index_buffer,
            index_base,
            texture,
            matrix_slot,
            first_index: (byte_offset / format.byte_width()) as u32,
            count,
        });
    }

    fn projection(&self) -> Affine2 {
        self.projection
    }
}


/// Images registered by the host, uploaded on first use.
#[derive(Debug, Default)]
pub struct WgpuTextures {
    sources: HashMap<TextureId, RgbaImage>,
    uploaded: HashMap<TextureId, (u32, TextureHandle)>,
    next_id: u64,
}
impl WgpuTextures {
    /// Registers `image` under a new id and returns the id.
    pub fn register(&mut self, image: RgbaImage) -> TextureId {
        let id = TextureId(self.next_id);
        self.next_id += 1;
        self.sources.insert(id, image);
        id
    }

    /// Width and height of a registered image.
    pub fn size(&self, texture: TextureId) -> Option<(u32, u32)> {
        self.sources.get(&texture).map(|image| image.dimensions())
    }

    /// Forgets the image and frees its GPU texture.
    pub fn remove(&mut self, context: &mut WgpuContext, texture: TextureId) {
        self.sources.remove(&texture);
        if let Some((_, handle)) = self.uploaded.remove(&texture) {
            context.delete_texture(handle);
        }
    }
}
impl TextureManager<WgpuContext> for WgpuTextures {
    fn gpu_texture(&self, texture: TextureId, generation: u32) -> Option<TextureHandle> {
        self.uploaded
            .get(&texture)
            .filter(|(created_in, _)| *created_in == generation)
            .map(|(_, handle)| *handle)
    }

    fn update_texture(&mut self, context: &mut WgpuContext, texture: TextureId) -> Result<TextureHandle, RenderError> {
        let image = self
            .sources
            .get(&texture)
            .ok_or_else(|| RenderError::TextureUpload(texture.0, "no image registered".to_owned()))?;

        if let Some((_, stale)) = self.uploaded.remove(&texture) {
            context.delete_texture(stale);
        }
        let handle = context.create_texture(&format!("Texture {}", texture.0), image);
        self.uploaded.insert(texture, (context.generation(), handle));
        Ok(handle)
    }
}


fn uniform_bind_group(device: &Device, layout: &BindGroupLayout, matrices: &DynamicBuffer<MatrixSlot>) -> BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Sprite3d uniforms"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: matrices.binding(NonZeroU64::new(64)),
        }],
    })
}

fn vertex_format(format: AttributeFormat) -> wgpu::VertexFormat {
    match format {
        AttributeFormat::Float32x2 => wgpu::VertexFormat::Float32x2,
        AttributeFormat::Float32x3 => wgpu::VertexFormat::Float32x3,
        AttributeFormat::Unorm8x4 => wgpu::VertexFormat::Unorm8x4,
    }
}

/// Blend equations for premultiplied colors.
fn blend_state(mode: BlendMode) -> wgpu::BlendState {
    use wgpu::{BlendComponent, BlendFactor, BlendOperation};

    let component = |src_factor: BlendFactor, dst_factor: BlendFactor| BlendComponent {
        src_factor,
        dst_factor,
        operation: BlendOperation::Add,
    };
    let alpha = component(BlendFactor::One, BlendFactor::OneMinusSrcAlpha);
    match mode {
        BlendMode::Normal => wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING,
        BlendMode::Add => wgpu::BlendState {
            color: component(BlendFactor::One, BlendFactor::One),
            alpha: component(BlendFactor::One, BlendFactor::One),
        },
        BlendMode::Multiply => wgpu::BlendState {
            color: component(BlendFactor::Dst, BlendFactor::OneMinusSrcAlpha),
            alpha,
        },
        BlendMode::Screen => wgpu::BlendState {
            color: component(BlendFactor::One, BlendFactor::OneMinusSrc),
            alpha,
        },
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::vertex::Vertex;

    #[test]
    fn matrix_slots_match_the_offset_alignment() {
        assert_eq!(MATRIX_SLOT_SIZE, BUFFER_ALIGNMENT);
        assert_eq!(align_to(0, 256), 0);
        assert_eq!(align_to(1, 256), 256);
        assert_eq!(align_to(96 * 3, 256), 512);
    }

    #[test]
    fn uploads_after_a_draw_move_without_resending_everything() {
        let mut range = BufferRange::new(960);

        let first = range.plan_upload(0, 288, 960);
        assert_eq!(first, UploadPlan { copy: None, write: (0, 288), write_at: 0 });

        // a draw reads [0, 960), the next flush must not overwrite it
        range.read = true;
        let second = range.plan_upload(0, 96, 960);
        assert_eq!(second, UploadPlan { copy: Some((0, 1024, 960)), write: (0, 96), write_at: 1024 });

        let in_place = range.plan_upload(96, 96, 960);
        assert_eq!(in_place, UploadPlan { copy: None, write: (96, 192), write_at: 1120 });

        range.read = true;
        let third = range.plan_upload(0, 96, 960);
        assert_eq!(third.copy, Some((1024, 2048, 960)));
        assert_eq!(third.write_at, 2048);

        // the next frame starts over at the front
        range.end_frame();
        let next_frame = range.plan_upload(0, 96, 960);
        assert_eq!(next_frame, UploadPlan { copy: Some((2048, 0, 960)), write: (0, 96), write_at: 0 });
        assert_eq!(range.end, 960);

        range.end_frame();
        assert_eq!(range.plan_upload(0, 96, 960).copy, None);
    }

    #[test]
    fn vertex_formats_match_attribute_sizes() {
        for attribute in Vertex::ATTRIBUTES {
            assert_eq!(vertex_format(attribute.format).size(), attribute.format.size());
        }
    }

    #[test]
    fn normal_blending_is_premultiplied() {
        assert_eq!(blend_state(BlendMode::Normal), wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING);
        assert_ne!(blend_state(BlendMode::Add), blend_state(BlendMode::Screen));
    }
}
