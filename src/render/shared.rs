use crate::obj::ObjMesh;

pub(crate) const SHADER: &str = r#"
struct GlobalUniform {
    view_proj: mat4x4<f32>,
    camera_position: vec4<f32>,
    light_direction: vec4<f32>,
    light_color: vec4<f32>,
    ambient: vec4<f32>,
}

struct ObjectConstants {
    model: mat4x4<f32>,
    normal: mat3x4<f32>,
    color: vec4<f32>,
    // x: metalness, y: 1.0 when drawn unlit (projected shadows)
    params: vec4<f32>,
}

@group(0) @binding(0)
var<uniform> globals: GlobalUniform;

@group(1) @binding(0)
var<uniform> object: ObjectConstants;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world_position = object.model * vec4<f32>(input.position, 1.0);
    out.position = globals.view_proj * world_position;
    out.world_pos = world_position.xyz;

    let world_normal = mat3x3<f32>(
        object.normal[0].xyz,
        object.normal[1].xyz,
        object.normal[2].xyz
    ) * input.normal;

    out.normal = world_normal;
    return out;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    if (object.params.y > 0.5) {
        return object.color;
    }

    var normal = normalize(input.normal);
    let view_dir = normalize(globals.camera_position.xyz - input.world_pos);
    if (dot(normal, view_dir) < 0.0) {
        normal = -normal;
    }

    let metalness = clamp(object.params.x, 0.0, 1.0);
    let light_dir = normalize(-globals.light_direction.xyz);
    let light = globals.light_color.xyz * globals.light_color.w;
    let diffuse = max(dot(normal, light_dir), 0.0);

    let half_dir = normalize(light_dir + view_dir);
    let shininess = mix(8.0, 128.0, metalness);
    let specular = pow(max(dot(normal, half_dir), 0.0), shininess) * metalness;

    let base = object.color.rgb;
    let diffuse_color = base * (1.0 - 0.5 * metalness);
    let specular_color = mix(vec3<f32>(0.04), base, metalness);
    let lit = (globals.ambient.rgb + diffuse * light) * diffuse_color
        + specular * specular_color * light;
    return vec4<f32>(lit, object.color.a);
}
"#;

/// Two triangles spanning `size` x `size` on the `y = 0` plane, facing up.
pub(crate) fn plane_mesh(size: f32) -> ObjMesh {
    let h = size * 0.5;
    #[rustfmt::skip]
    let vertices = vec![
        // positions     // normals
        -h, 0.0, -h,     0.0, 1.0, 0.0,
        -h, 0.0,  h,     0.0, 1.0, 0.0,
         h, 0.0,  h,     0.0, 1.0, 0.0,
         h, 0.0, -h,     0.0, 1.0, 0.0,
    ];
    ObjMesh {
        vertices,
        indices: vec![0, 1, 2, 0, 2, 3],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_spans_requested_size() {
        let mesh = plane_mesh(100.0);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        let xs: Vec<f32> = mesh.vertices.chunks_exact(6).map(|v| v[0]).collect();
        assert_eq!(xs, [-50.0, -50.0, 50.0, 50.0]);
        assert!(mesh.vertices.chunks_exact(6).all(|v| v[1] == 0.0 && v[4] == 1.0));
    }
}
