//! End-to-end bake tests on the software device.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use texbake::*;
use texbake_render::{
    PixelBuffer, PixelFormat, ReadRect, RenderResult, Replacement, ShaderHandle, TargetDescriptor,
};

const SIZE: u32 = 8;
const PNG_MAGIC: [u8; 4] = [0x89, b'P', b'N', b'G'];
const EXR_MAGIC: [u8; 4] = [0x76, 0x2f, 0x31, 0x01];

/// A red ground on layer 0 under a roof on layer 1, seen from above, with
/// two live lights and one disabled light on an inactive object.
fn test_scene() -> Scene {
    let mut camera =
        Camera::new("Cam").looking_at(Vec3::new(0.0, 10.0, 0.0), Vec3::ZERO, Vec3::NEG_Z);
    camera.background = Vec4::new(0.1, 0.2, 0.3, 1.0);

    let mut rim = Light::directional("Rim", Vec3::new(-1.0, -1.0, 0.0).normalize());
    rim.enabled = false;
    rim.object_active = false;

    Scene::new()
        .with_camera(camera)
        .with_light(Light::directional("SunLight", Vec3::NEG_Y))
        .with_light(Light::point("Fill", Vec3::new(3.0, 4.0, 0.0), 20.0))
        .with_light(rim)
        .with_object(
            MeshObject::plane("Ground", Vec3::ZERO, 20.0)
                .with_material(Material::new("Red", Vec4::new(1.0, 0.0, 0.0, 1.0)))
                .with_occlusion(vec![0.5; 4]),
        )
        .with_object(MeshObject::plane("Roof", Vec3::new(0.0, 5.0, 0.0), 1.5).with_layer(1))
}

fn test_options() -> BakeOptions {
    BakeOptions::default()
        .with_resolution(SIZE, SIZE)
        .with_output_folder("out")
}

fn bake(scene: &mut Scene, options: &BakeOptions) -> (BakeResult, SoftwareDevice, MemoryHost) {
    let mut device = SoftwareDevice::new();
    let mut host = MemoryHost::new();
    let result = run_bake(scene, "Cam", options, &mut device, &mut host);
    (result, device, host)
}

fn decode(bytes: &[u8]) -> image::RgbaImage {
    image::load_from_memory(bytes).unwrap().to_rgba8()
}

/// Delegates to a [`SoftwareDevice`], failing or panicking on one render call.
struct FaultyDevice {
    inner: SoftwareDevice,
    renders: usize,
    fault_at: usize,
    panic: bool,
}

impl FaultyDevice {
    fn new(fault_at: usize, panic: bool) -> Self {
        Self {
            inner: SoftwareDevice::new(),
            renders: 0,
            fault_at,
            panic,
        }
    }

    fn tick(&mut self) -> RenderResult<()> {
        self.renders += 1;
        if self.renders == self.fault_at {
            if self.panic {
                panic!("driver crashed");
            }
            return Err(RenderError::DeviceLost("driver reset".to_string()));
        }
        Ok(())
    }
}

impl RenderDevice for FaultyDevice {
    fn name(&self) -> &str {
        "faulty"
    }

    fn find_shader(&self, name: &str) -> Option<ShaderHandle> {
        self.inner.find_shader(name)
    }

    fn create_target(&mut self, desc: &TargetDescriptor) -> RenderResult<TargetId> {
        self.inner.create_target(desc)
    }

    fn destroy_target(&mut self, id: TargetId) {
        self.inner.destroy_target(id);
    }

    fn target_descriptor(&self, id: TargetId) -> Option<&TargetDescriptor> {
        self.inner.target_descriptor(id)
    }

    fn allocated_targets(&self) -> usize {
        self.inner.allocated_targets()
    }

    fn set_replacement(&mut self, replacement: Option<Replacement>) {
        self.inner.set_replacement(replacement);
    }

    fn replacement(&self) -> Option<&Replacement> {
        self.inner.replacement()
    }

    fn render(&mut self, scene: &Scene, camera: &Camera) -> RenderResult<()> {
        self.tick()?;
        self.inner.render(scene, camera)
    }

    fn render_depth(&mut self, scene: &Scene, camera: &Camera) -> RenderResult<()> {
        self.tick()?;
        self.inner.render_depth(scene, camera)
    }

    fn blit(&mut self, src: TargetId, dst: TargetId) -> RenderResult<()> {
        self.inner.blit(src, dst)
    }

    fn set_active_target(&mut self, target: Option<TargetId>) {
        self.inner.set_active_target(target);
    }

    fn active_target(&self) -> Option<TargetId> {
        self.inner.active_target()
    }

    fn read_pixels(&self, rect: ReadRect, format: PixelFormat) -> RenderResult<PixelBuffer> {
        self.inner.read_pixels(rect, format)
    }
}

fn assert_device_clean(device: &dyn RenderDevice) {
    assert_eq!(device.allocated_targets(), 0, "offscreen targets leaked");
    assert_eq!(device.active_target(), None, "readback binding leaked");
    assert!(device.replacement().is_none(), "replacement shader leaked");
}

#[test]
fn filenames_follow_schedule_and_lights() {
    let mut scene = test_scene();
    let (result, _, host) = bake(&mut scene, &test_options());

    assert!(result.is_success(), "{result}");
    let expected: Vec<PathBuf> = [
        "Cam_Depth.exr",
        "Cam_Albedo.png",
        "Cam_AO.png",
        "Cam_Alpha.png",
        "Cam_Normal.png",
        "Cam_Shaded_SunLight.png",
        "Cam_Shaded_Fill.png",
        "Cam_Shaded_Rim.png",
        "Cam_Shadow_SunLight.png",
        "Cam_Shadow_Fill.png",
        "Cam_Shadow_Rim.png",
    ]
    .iter()
    .map(|name| Path::new("out").join(name))
    .collect();
    assert_eq!(result.written_files(), expected.iter().map(PathBuf::as_path).collect::<Vec<_>>());
    assert_eq!(host.files().len(), expected.len());
    assert_eq!(host.refresh_count(), 1);
}

#[test]
fn scene_state_restored_after_bake() {
    let mut scene = test_scene();
    let before = scene.clone();
    let (result, device, _) = bake(&mut scene, &test_options());

    assert_eq!(result.state, BakeState::Done);
    assert_eq!(scene.cameras, before.cameras);
    assert_eq!(scene.lights, before.lights);
    assert_device_clean(&device);
}

#[test]
fn each_per_light_render_sees_exactly_one_light() {
    let mut scene = test_scene();
    let (_, device, _) = bake(&mut scene, &test_options());

    let per_light: Vec<&RenderRecord> = device
        .render_log()
        .iter()
        .filter(|r| !r.depth && matches!(r.shader.as_deref(), None | Some("Bake/ShadowReceiver")))
        .collect();
    assert_eq!(per_light.len(), 6);
    let order: Vec<&str> = per_light.iter().map(|r| r.live_lights[0].as_str()).collect();
    assert_eq!(order, ["SunLight", "Fill", "Rim", "SunLight", "Fill", "Rim"]);
    assert!(per_light.iter().all(|r| r.live_lights.len() == 1));

    // passes outside the per-light groups see the scene's own lighting
    let albedo = device
        .render_log()
        .iter()
        .find(|r| r.shader.as_deref() == Some("Bake/Albedo"))
        .unwrap();
    assert_eq!(albedo.live_lights, ["SunLight", "Fill"]);
}

#[test]
fn only_shadow_passes_override_near_clip_and_mask() {
    let mut scene = test_scene();
    let receivers = LayerMask::from_layers(&[0]);
    let options = test_options().with_masks(LayerMask::EVERYTHING, receivers);
    let (_, device, _) = bake(&mut scene, &options);

    for record in device.render_log() {
        if record.shader.as_deref() == Some("Bake/ShadowReceiver") {
            assert!((record.near - 0.01).abs() < f32::EPSILON);
            assert_eq!(record.culling_mask, receivers);
        } else {
            assert!((record.near - 0.3).abs() < f32::EPSILON, "{record:?}");
            assert_eq!(record.culling_mask, LayerMask::EVERYTHING);
        }
    }
}

#[test]
fn shadow_maps_attribute_shadows_to_each_light() {
    let mut scene = test_scene();
    let options = test_options().with_masks(LayerMask::EVERYTHING, LayerMask::from_layers(&[0]));
    let (_, _, host) = bake(&mut scene, &options);

    let center = |name: &str| {
        let bytes = host.file(Path::new("out").join(name)).unwrap();
        decode(bytes).get_pixel(SIZE / 2, SIZE / 2).0
    };
    // the roof blocks the sun straight above but not the low fill light
    assert_eq!(center("Cam_Shadow_SunLight.png"), [0, 0, 0, 255]);
    assert_eq!(center("Cam_Shadow_Fill.png"), [255, 255, 255, 255]);
}

#[test]
fn inverted_shadow_uses_inverted_shader() {
    let mut scene = test_scene();
    let mut options = test_options().with_masks(LayerMask::EVERYTHING, LayerMask::from_layers(&[0]));
    options.invert_shadow_color = true;
    let (_, device, host) = bake(&mut scene, &options);

    assert!(device
        .render_log()
        .iter()
        .any(|r| r.shader.as_deref() == Some("Bake/ShadowReceiverInverted")));
    let bytes = host.file("out/Cam_Shadow_SunLight.png").unwrap();
    assert_eq!(decode(bytes).get_pixel(SIZE / 2, SIZE / 2).0, [255, 255, 255, 255]);
}

#[test]
fn unresolved_ao_shader_skips_only_ao() {
    let mut scene = test_scene();
    let mut options = test_options();
    options.shaders.remove(ShaderSlot::AmbientOcclusion);
    let (result, device, host) = bake(&mut scene, &options);

    assert_eq!(result.state, BakeState::Done);
    let unsuccessful: Vec<&str> = result
        .passes
        .iter()
        .filter(|p| !p.is_success())
        .map(|p| p.label.as_str())
        .collect();
    assert_eq!(unsuccessful, ["AO"]);
    assert!(matches!(result.outcome("AO", None).unwrap().status, PassStatus::Skipped(_)));
    assert!(host.file("out/Cam_AO.png").is_none());
    for name in ["Cam_Albedo.png", "Cam_Normal.png", "Cam_Alpha.png", "Cam_Shadow_Fill.png"] {
        assert!(host.file(Path::new("out").join(name)).is_some(), "{name}");
    }
    assert_device_clean(&device);
}

#[test]
fn shader_missing_from_device_is_skipped() {
    let mut scene = test_scene();
    let mut device = SoftwareDevice::new();
    device.unregister_shader("Bake/Normal");
    let mut host = MemoryHost::new();
    let result = run_bake(&mut scene, "Cam", &test_options(), &mut device, &mut host);

    match &result.outcome("Normal", None).unwrap().status {
        PassStatus::Skipped(cause) => assert!(cause.contains("Bake/Normal")),
        other => panic!("expected skip, got {other:?}"),
    }
    assert_eq!(result.skipped().count(), 1);
    assert_eq!(result.failed().count(), 0);
}

#[test]
fn depth_encodes_as_float_and_colors_as_png() {
    let mut scene = test_scene();
    let (_, _, host) = bake(&mut scene, &test_options());

    let depth = host.file("out/Cam_Depth.exr").unwrap();
    assert_eq!(&depth[..4], &EXR_MAGIC);
    assert!(matches!(
        image::load_from_memory(depth).unwrap(),
        image::DynamicImage::ImageRgba32F(_)
    ));
    let albedo = host.file("out/Cam_Albedo.png").unwrap();
    assert_eq!(&albedo[..4], &PNG_MAGIC);
    assert_eq!(decode(albedo).get_pixel(0, 0).0, [255, 0, 0, 255]);

    let options = test_options().with_extensions("png", "tga");
    let mut scene = test_scene();
    let (result, _, host) = bake(&mut scene, &options);
    assert!(result.is_success());
    assert_eq!(&host.file("out/Cam_Depth.png").unwrap()[..4], &PNG_MAGIC);
    assert!(host.file("out/Cam_Albedo.tga").is_some());
}

#[test]
fn identical_bakes_write_identical_bytes() {
    let options = test_options();
    let mut scene = test_scene();
    let (_, _, first) = bake(&mut scene, &options);
    let (_, _, second) = bake(&mut scene, &options);
    assert_eq!(first.files(), second.files());
}

#[test]
fn render_failure_aborts_and_restores() {
    let mut scene = test_scene();
    let before = scene.clone();
    // third render call is the AO pass
    let mut device = FaultyDevice::new(3, false);
    let mut host = MemoryHost::new();
    let result = run_bake(&mut scene, "Cam", &test_options(), &mut device, &mut host);

    assert_eq!(result.state, BakeState::Failed);
    assert!(result.error.as_deref().unwrap().contains("driver reset"));
    assert_eq!(result.succeeded().count(), 2);
    assert_eq!(scene.cameras, before.cameras);
    assert_eq!(scene.lights, before.lights);
    assert_device_clean(&device);
    assert_eq!(host.refresh_count(), 0);
}

#[test]
fn render_failure_inside_light_group_restores_lights() {
    let mut scene = test_scene();
    let before = scene.clone();
    // render 7 is the second light of the shaded group
    let mut device = FaultyDevice::new(7, false);
    let mut host = MemoryHost::new();
    let result = run_bake(&mut scene, "Cam", &test_options(), &mut device, &mut host);

    assert_eq!(result.state, BakeState::Failed);
    assert_eq!(scene.lights, before.lights);
    assert_device_clean(&device);
}

#[test]
fn panic_during_pass_leaves_no_state_behind() {
    let mut scene = test_scene();
    let before = scene.clone();
    let mut device = FaultyDevice::new(9, true);
    let mut host = MemoryHost::new();

    let outcome = catch_unwind(AssertUnwindSafe(|| {
        run_bake(&mut scene, "Cam", &test_options(), &mut device, &mut host)
    }));

    assert!(outcome.is_err());
    assert_eq!(scene.cameras, before.cameras);
    assert_eq!(scene.lights, before.lights);
    assert_device_clean(&device);
}

/// A [`MemoryHost`] whose writes to one file name fail.
struct FlakyHost {
    inner: MemoryHost,
    failing: &'static str,
}

impl BakeHost for FlakyHost {
    fn ensure_directory(&mut self, path: &Path) -> Result<()> {
        self.inner.ensure_directory(path)
    }

    fn write_file(&mut self, path: &Path, bytes: &[u8]) -> Result<()> {
        if path.file_name().is_some_and(|name| name == self.failing) {
            return Err(BakeError::WriteError {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            });
        }
        self.inner.write_file(path, bytes)
    }

    fn refresh_assets(&mut self) {
        self.inner.refresh_assets();
    }
}

#[test]
fn write_failure_fails_only_that_pass() {
    let mut scene = test_scene();
    let before = scene.clone();
    let mut device = SoftwareDevice::new();
    let mut host = FlakyHost {
        inner: MemoryHost::new(),
        failing: "Cam_AO.png",
    };
    let result = run_bake(&mut scene, "Cam", &test_options(), &mut device, &mut host);

    assert_eq!(result.state, BakeState::Done);
    let failed: Vec<&str> = result.failed().map(|p| p.label.as_str()).collect();
    assert_eq!(failed, ["AO"]);
    match &result.outcome("AO", None).unwrap().status {
        PassStatus::Failed(cause) => assert!(cause.contains("disk full"), "{cause}"),
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(result.has_failures());
    assert_eq!(result.skipped().count(), 0);
    assert!(host.inner.file("out/Cam_AO.png").is_none());
    for name in ["Cam_Depth.exr", "Cam_Albedo.png", "Cam_Alpha.png", "Cam_Normal.png", "Cam_Shadow_Rim.png"] {
        assert!(host.inner.file(Path::new("out").join(name)).is_some(), "{name}");
    }
    assert_eq!(host.inner.refresh_count(), 1);
    assert_eq!(scene, before);
    assert_device_clean(&device);
}

#[test]
fn lights_sharing_a_name_do_not_overwrite_each_other() {
    let mut scene = test_scene();
    scene.lights = vec![
        Light::directional("Point Light", Vec3::NEG_Y),
        Light::point("Point Light", Vec3::new(3.0, 4.0, 0.0), 20.0),
    ];
    let passes = PassToggles {
        shaded: true,
        ..PassToggles::none()
    };
    let (result, _, host) = bake(&mut scene, &test_options().with_passes(passes));

    assert_eq!(result.state, BakeState::Done);
    assert_eq!(result.passes.len(), 2);
    assert!(result.passes[0].is_success());
    match &result.passes[1].status {
        PassStatus::Failed(cause) => assert!(cause.contains("duplicate output path"), "{cause}"),
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(result.written_files().len(), 1);
    assert_eq!(host.files().len(), 1);
    assert!(!result.is_success());
    assert!(result.has_failures());
}

#[test]
fn scene_without_lights_skips_light_groups() {
    let mut scene = test_scene();
    scene.lights.clear();
    let (result, _, _) = bake(&mut scene, &test_options());

    assert_eq!(result.state, BakeState::Done);
    let skipped: Vec<&str> = result.skipped().map(|p| p.label.as_str()).collect();
    assert_eq!(skipped, ["Shaded", "Shadow"]);
}

#[test]
fn custom_shader_passes_follow_builtin_overrides() {
    let mut scene = test_scene();
    let mut device = SoftwareDevice::new();
    device.register_shader("Custom/Unlit", BuiltinProgram::Albedo, &[]);
    let mut options = test_options();
    options.custom_shaders = vec!["Custom/Unlit".to_string(), "Missing/Thing".to_string()];
    let mut host = MemoryHost::new();
    let result = run_bake(&mut scene, "Cam", &options, &mut device, &mut host);

    let labels: Vec<&str> = result.passes.iter().map(|p| p.label.as_str()).collect();
    assert_eq!(&labels[..7], ["Depth", "Albedo", "AO", "Alpha", "Normal", "Custom_Unlit", "Missing_Thing"]);
    assert!(host.file("out/Cam_Custom_Unlit.png").is_some());
    assert!(matches!(
        result.outcome("Missing_Thing", None).unwrap().status,
        PassStatus::Skipped(_)
    ));
}

#[test]
fn batch_bakes_each_camera_and_refreshes_once() {
    let mut scene = test_scene();
    let mut side = Camera::new("Side").looking_at(Vec3::new(10.0, 2.0, 0.0), Vec3::ZERO, Vec3::Y);
    side.near = 0.5;
    scene.cameras.push(side);
    let mut device = SoftwareDevice::new();
    let mut host = MemoryHost::new();

    let results = run_batch(
        &mut scene,
        &["Cam", "Missing", "Side"],
        &test_options(),
        &mut device,
        &mut host,
    )
    .unwrap();

    let states: Vec<BakeState> = results.iter().map(|r| r.state).collect();
    assert_eq!(states, [BakeState::Done, BakeState::Failed, BakeState::Done]);
    assert!(host.file("out/Side_Albedo.png").is_some());
    assert_eq!(host.refresh_count(), 1);
    assert!((scene.cameras[1].near - 0.5).abs() < f32::EPSILON);
    assert_device_clean(&device);
}

#[test]
fn shared_scene_bakes_serialize() {
    let scene = Arc::new(Mutex::new(test_scene()));
    let before = test_scene();
    let options = Arc::new(test_options());

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let scene = Arc::clone(&scene);
            let options = Arc::clone(&options);
            std::thread::spawn(move || {
                let mut device = SoftwareDevice::new();
                let mut host = MemoryHost::new();
                run_bake_shared(&scene, "Cam", &options, &mut device, &mut host)
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap().is_success());
    }
    let scene = scene.lock().unwrap();
    assert_eq!(scene.cameras, before.cameras);
    assert_eq!(scene.lights, before.lights);
}

#[test]
fn fs_host_writes_real_files() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("sprites");
    let options = test_options().with_output_folder(&out);
    let mut scene = test_scene();
    let mut device = SoftwareDevice::new();
    let mut host = FsHost::new();

    let result = run_bake(&mut scene, "Cam", &options, &mut device, &mut host);
    assert!(result.is_success(), "{result}");
    for path in result.written_files() {
        assert!(path.starts_with(&out));
        assert!(path.exists(), "{}", path.display());
    }
    let albedo = image::open(out.join("Cam_Albedo.png")).unwrap().to_rgba8();
    assert_eq!(albedo.dimensions(), (SIZE, SIZE));
}

proptest::proptest! {
    #![proptest_config(proptest::prelude::ProptestConfig::with_cases(24))]

    #[test]
    fn any_pass_selection_restores_state(
        flags in proptest::collection::vec(proptest::bool::ANY, 7),
        invert in proptest::bool::ANY,
    ) {
        let passes = PassToggles {
            depth: flags[0],
            albedo: flags[1],
            ambient_occlusion: flags[2],
            alpha: flags[3],
            normal: flags[4],
            shaded: flags[5],
            shadow: flags[6],
        };
        let mut options = test_options().with_resolution(4, 4).with_passes(passes);
        options.invert_shadow_color = invert;
        let mut scene = test_scene();
        let before = scene.clone();
        let (result, device, _) = bake(&mut scene, &options);

        proptest::prop_assert_eq!(result.state, BakeState::Done);
        proptest::prop_assert_eq!(&scene, &before);
        proptest::prop_assert_eq!(device.allocated_targets(), 0);
        proptest::prop_assert_eq!(device.active_target(), None);
        proptest::prop_assert!(device.replacement().is_none());
    }
}
