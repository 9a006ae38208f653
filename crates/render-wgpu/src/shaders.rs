/// Coloured quad drawn straight in clip space.
pub const QUAD_SHADER: &str = r#"
struct QuadVertex {
    @location(0) position: vec2<f32>,
    @location(1) colour: vec3<f32>,
};

struct QuadOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) colour: vec3<f32>,
};

@vertex
fn vs_main(vertex: QuadVertex) -> QuadOutput {
    var out: QuadOutput;
    out.clip_position = vec4<f32>(vertex.position, 0.0, 1.0);
    out.colour = vertex.colour;
    return out;
}

@fragment
fn fs_main(in: QuadOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(in.colour, 1.0);
}
"#;

/// Untransformed mesh coloured by its normals.
pub const MESH_SHADER: &str = r#"
struct MeshVertex {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct MeshOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) normal: vec3<f32>,
};

@vertex
fn vs_main(vertex: MeshVertex) -> MeshOutput {
    var out: MeshOutput;
    out.clip_position = vec4<f32>(vertex.position, 1.0);
    out.normal = vertex.normal;
    return out;
}

@fragment
fn fs_main(in: MeshOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(in.normal, 1.0);
}
"#;

/// Split-sum BRDF integration into an RG target, one full-screen triangle.
pub const BRDF_SHADER: &str = r#"
const PI: f32 = 3.14159265359;
const SAMPLE_COUNT: u32 = 1024u;

struct LutOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> LutOutput {
    let uv = vec2<f32>(f32((index << 1u) & 2u), f32(index & 2u));
    var out: LutOutput;
    out.uv = uv;
    out.clip_position = vec4<f32>(uv * 2.0 - 1.0, 0.0, 1.0);
    return out;
}

fn hammersley(i: u32, count: u32) -> vec2<f32> {
    return vec2<f32>(f32(i) / f32(count), f32(reverseBits(i)) * 2.3283064365386963e-10);
}

fn importance_sample_ggx(xi: vec2<f32>, roughness: f32, normal: vec3<f32>) -> vec3<f32> {
    let alpha = roughness * roughness;
    let phi = 2.0 * PI * xi.x;
    let cos_theta = sqrt((1.0 - xi.y) / (1.0 + (alpha * alpha - 1.0) * xi.y));
    let sin_theta = sqrt(1.0 - cos_theta * cos_theta);
    let h = vec3<f32>(sin_theta * cos(phi), sin_theta * sin(phi), cos_theta);
    let up = select(vec3<f32>(1.0, 0.0, 0.0), vec3<f32>(0.0, 0.0, 1.0), abs(normal.z) < 0.999);
    let tangent_x = normalize(cross(up, normal));
    let tangent_y = normalize(cross(normal, tangent_x));
    return normalize(tangent_x * h.x + tangent_y * h.y + normal * h.z);
}

fn geometry_schlick_smith_ggx(dot_nl: f32, dot_nv: f32, roughness: f32) -> f32 {
    let k = (roughness * roughness) / 2.0;
    let gl = dot_nl / (dot_nl * (1.0 - k) + k);
    let gv = dot_nv / (dot_nv * (1.0 - k) + k);
    return gl * gv;
}

fn integrate_brdf(dot_nv: f32, roughness: f32) -> vec2<f32> {
    let n = vec3<f32>(0.0, 0.0, 1.0);
    let v = vec3<f32>(sqrt(1.0 - dot_nv * dot_nv), 0.0, dot_nv);
    var lut = vec2<f32>(0.0, 0.0);
    for (var i = 0u; i < SAMPLE_COUNT; i = i + 1u) {
        let xi = hammersley(i, SAMPLE_COUNT);
        let h = importance_sample_ggx(xi, roughness, n);
        let l = 2.0 * dot(v, h) * h - v;
        let dot_nl = max(dot(n, l), 0.0);
        let dot_vh = max(dot(v, h), 0.0);
        let dot_nh = max(dot(h, n), 0.0);
        if (dot_nl > 0.0) {
            let g = geometry_schlick_smith_ggx(dot_nl, dot_nv, roughness);
            let g_vis = (g * dot_vh) / (dot_nh * dot_nv);
            let fc = pow(1.0 - dot_vh, 5.0);
            lut = lut + vec2<f32>((1.0 - fc) * g_vis, fc * g_vis);
        }
    }
    return lut / f32(SAMPLE_COUNT);
}

@fragment
fn fs_main(in: LutOutput) -> @location(0) vec2<f32> {
    return integrate_brdf(max(in.uv.x, 0.001), 1.0 - in.uv.y);
}
"#;
