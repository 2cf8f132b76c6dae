//! Static checks that the WGSL and GLSL programs agree on their interface.
//! Runs without a GPU.

use naga::{AddressSpace, ResourceBinding, ShaderStage, TypeInner};
use pixelate_core::{PixelateConfig, SIZE_UNIFORM};
use pixelate_gpu::program::{
    FILTER_VERTEX_GLSL, FILTER_VERTEX_WGSL, PIXELATE_GLSL, PIXELATE_WGSL,
};
use pixelate_gpu::{GlobalFilterUniforms, PixelateUniforms};

fn wgsl(source: &str) -> naga::Module {
    naga::front::wgsl::parse_str(source).unwrap_or_else(|e| panic!("{}", e.emit_to_string(source)))
}

fn glsl(source: &str, stage: ShaderStage) -> naga::Module {
    naga::front::glsl::Frontend::default()
        .parse(&naga::front::glsl::Options::from(stage), source)
        .unwrap_or_else(|e| panic!("{e:?}"))
}

/// Sorted (group, binding) pairs with the struct size of uniform buffers.
fn bindings(module: &naga::Module) -> Vec<(u32, u32, Option<u32>)> {
    let mut out: Vec<_> = module
        .global_variables
        .iter()
        .filter_map(|(_, var)| {
            let ResourceBinding { group, binding } = var.binding.clone()?;
            let span = match (&var.space, &module.types[var.ty].inner) {
                (AddressSpace::Uniform, TypeInner::Struct { span, .. }) => Some(*span),
                _ => None,
            };
            Some((group, binding, span))
        })
        .collect();
    out.sort();
    out
}

#[test]
fn fragment_stages_bind_the_same_resources() {
    let w = bindings(&wgsl(PIXELATE_WGSL));
    let g = bindings(&glsl(PIXELATE_GLSL, ShaderStage::Fragment));
    assert_eq!(w, g);
    assert_eq!(
        w,
        vec![
            (0, 0, Some(std::mem::size_of::<GlobalFilterUniforms>() as u32)),
            (0, 1, None),
            (0, 2, None),
            (1, 0, Some(std::mem::size_of::<PixelateUniforms>() as u32)),
        ]
    );
}

#[test]
fn pixelate_uniforms_put_block_size_first() {
    let module = wgsl(PIXELATE_WGSL);
    let (_, var) = module
        .global_variables
        .iter()
        .find(|(_, v)| v.name.as_deref() == Some("pixelateUniforms"))
        .expect("pixelateUniforms global");
    let TypeInner::Struct { members, .. } = &module.types[var.ty].inner else {
        panic!("pixelateUniforms is not a struct");
    };
    assert_eq!(members[0].name.as_deref(), Some("uSize"));
    assert_eq!(members[0].offset, 0);
    assert!(matches!(
        module.types[members[0].ty].inner,
        TypeInner::Vector {
            size: naga::VectorSize::Bi,
            ..
        }
    ));
}

#[test]
fn size_uniform_is_declared_with_its_host_type_in_both_languages() {
    let ty = PixelateConfig::default()
        .uniforms()
        .get(SIZE_UNIFORM)
        .map(|u| u.ty)
        .expect("uSize uniform");
    let wgsl_decl = format!("{SIZE_UNIFORM}: {},", ty.wgsl());
    let glsl_decl = format!("{} {SIZE_UNIFORM};", ty.glsl());
    assert!(PIXELATE_WGSL.contains(&wgsl_decl), "missing `{wgsl_decl}`");
    assert!(PIXELATE_GLSL.contains(&glsl_decl), "missing `{glsl_decl}`");
}

#[test]
fn vertex_stages_export_the_declared_entry_points() {
    let w = wgsl(FILTER_VERTEX_WGSL);
    assert!(w
        .entry_points
        .iter()
        .any(|ep| ep.name == "mainVertex" && ep.stage == ShaderStage::Vertex));

    let g = glsl(FILTER_VERTEX_GLSL, ShaderStage::Vertex);
    assert!(g
        .entry_points
        .iter()
        .any(|ep| ep.name == "main" && ep.stage == ShaderStage::Vertex));
}

#[test]
fn fragment_entry_points() {
    let w = wgsl(PIXELATE_WGSL);
    assert_eq!(w.entry_points.len(), 1);
    assert_eq!(w.entry_points[0].name, "mainFragment");
    assert_eq!(w.entry_points[0].stage, ShaderStage::Fragment);

    let g = glsl(PIXELATE_GLSL, ShaderStage::Fragment);
    assert_eq!(g.entry_points[0].name, "main");
    assert_eq!(g.entry_points[0].stage, ShaderStage::Fragment);
}
