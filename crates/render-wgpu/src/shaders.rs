/// WGSL shader for lit model proxies: metal/rough shading, ACES tone mapping.
pub const MODEL_SHADER: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    // xyz: camera position, w: exposure
    camera: vec4<f32>,
    // xyz: direction towards the key light, w: ambient intensity
    light: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct InstanceInput {
    @location(2) model_0: vec4<f32>,
    @location(3) model_1: vec4<f32>,
    @location(4) model_2: vec4<f32>,
    @location(5) model_3: vec4<f32>,
    @location(6) color: vec4<f32>,
    // x: metalness, y: roughness
    @location(7) material: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) color: vec4<f32>,
    @location(3) material: vec2<f32>,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    let world_pos = model * vec4<f32>(vertex.position, 1.0);

    var out: VertexOutput;
    out.clip_position = globals.view_proj * world_pos;
    out.world_position = world_pos.xyz;
    out.world_normal = normalize((model * vec4<f32>(vertex.normal, 0.0)).xyz);
    out.color = instance.color;
    out.material = instance.material.xy;
    return out;
}

// Narkowicz fit of the ACES filmic curve.
fn aces_filmic(x: vec3<f32>) -> vec3<f32> {
    let a = 2.51;
    let b = 0.03;
    let c = 2.43;
    let d = 0.59;
    let e = 0.14;
    return clamp((x * (a * x + b)) / (x * (c * x + d) + e), vec3<f32>(0.0), vec3<f32>(1.0));
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let metalness = in.material.x;
    let roughness = max(in.material.y, 0.04);
    let base = in.color.rgb;

    let n = normalize(in.world_normal);
    let l = normalize(globals.light.xyz);
    let v = normalize(globals.camera.xyz - in.world_position);
    let h = normalize(l + v);

    let n_dot_l = max(dot(n, l), 0.0);
    let n_dot_h = max(dot(n, h), 0.0);

    let f0 = mix(vec3<f32>(0.04), base, metalness);
    let shininess = clamp(2.0 / (roughness * roughness * roughness * roughness) - 2.0, 1.0, 2048.0);
    let specular = f0 * pow(n_dot_h, shininess) * (shininess + 8.0) / 25.13;
    let diffuse = base * (1.0 - metalness) * n_dot_l;

    // Metals pick up the environment tint instead of a flat ambient term.
    let ambient = globals.light.w * mix(base, f0, metalness);

    let hdr = (ambient + diffuse + specular * n_dot_l) * globals.camera.w;
    return vec4<f32>(aces_filmic(hdr), in.color.a);
}
"#;
