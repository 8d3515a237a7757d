use std::borrow::Cow;

use wgpu::naga::ShaderStage;

use crate::compositor::QUAD_DEPTH;

/// Number of vertices in the full-screen quad (two triangles).
pub(crate) const QUAD_VERTEX_COUNT: u32 = 6;

/// Compiles the full-screen quad vertex shader.
pub(crate) fn compile_vertex_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("strand quad vertex"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(vertex_source()),
            stage: ShaderStage::Vertex,
            defines: &[],
        },
    })
}

/// Compiles the two-texture compositing fragment shader.
pub(crate) fn compile_fragment_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("strand composite fragment"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(FRAGMENT_SHADER_GLSL),
            stage: ShaderStage::Fragment,
            defines: &[],
        },
    })
}

/// Vertex shader with the quad depth baked in.
fn vertex_source() -> String {
    format!("#version 450\nconst float QUAD_DEPTH = {QUAD_DEPTH:?};\n{VERTEX_SHADER_BODY}")
}

/// Positions are clip space. Rasterized rows map to screen rows top to bottom
/// and columns are mirrored, so the layer's right edge lands on the left.
const VERTEX_SHADER_BODY: &str = r"layout(location = 0) out vec2 v_uv;

const vec2 positions[6] = vec2[6](
    vec2(-1.0, -1.0),
    vec2(1.0, -1.0),
    vec2(-1.0, 1.0),
    vec2(-1.0, 1.0),
    vec2(1.0, -1.0),
    vec2(1.0, 1.0)
);

void main() {
    vec2 pos = positions[gl_VertexIndex];
    v_uv = 0.5 * (1.0 - pos);
    gl_Position = vec4(pos, QUAD_DEPTH, 1.0);
}
";

/// RGB from the colour layer, alpha from the mask layer's red channel.
const FRAGMENT_SHADER_GLSL: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 out_color;

layout(set = 0, binding = 0) uniform texture2D color_layer;
layout(set = 0, binding = 1) uniform texture2D mask_layer;
layout(set = 0, binding = 2) uniform sampler layer_sampler;

void main() {
    vec3 rgb = texture(sampler2D(color_layer, layer_sampler), v_uv).rgb;
    float alpha = texture(sampler2D(mask_layer, layer_sampler), v_uv).r;
    out_color = vec4(rgb, alpha);
}
";
