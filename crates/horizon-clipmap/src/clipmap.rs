//! The clipmap orchestrator: owns the block meshes and draws the rings.

use horizon_config::{ClipmapConfig, Config};

use crate::assembler::{ClipmapAssembler, ConnectorCoverage};
use crate::backend::{FillMode, FrameContext, GraphicsBackend, Uniform};
use crate::block::Block;
use crate::error::ClipmapError;
use crate::layout::{ClipmapLayout, MeshShape};
use crate::mesh::{PRIMITIVE_RESTART, StripStitching, TileMeshFactory};

/// Name passed to [`GraphicsBackend::create_program`].
pub const PROGRAM_NAME: &str = "clipmap";

impl From<horizon_config::StripStitching> for StripStitching {
    fn from(setting: horizon_config::StripStitching) -> Self {
        match setting {
            horizon_config::StripStitching::PrimitiveRestart => Self::PrimitiveRestart,
            horizon_config::StripStitching::DegenerateTriangles => Self::DegenerateTriangles,
        }
    }
}

impl From<horizon_config::ConnectorCoverage> for ConnectorCoverage {
    fn from(setting: horizon_config::ConnectorCoverage) -> Self {
        match setting {
            horizon_config::ConnectorCoverage::HorizontalOnly => Self::HorizontalOnly,
            horizon_config::ConnectorCoverage::Both => Self::Both,
        }
    }
}

/// Draw counts for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    per_shape: [u32; MeshShape::COUNT],
    /// Number of levels drawn.
    pub levels: u32,
}

impl FrameStats {
    fn record(&mut self, shape: MeshShape) {
        self.per_shape[shape.index()] += 1;
    }

    /// Draw calls issued for one shape.
    pub fn count(&self, shape: MeshShape) -> u32 {
        self.per_shape[shape.index()]
    }

    /// Total draw calls issued.
    pub fn draw_calls(&self) -> u32 {
        self.per_shape.iter().sum()
    }
}

/// A set of nested rings centred on the camera.
///
/// Every block mesh is built and uploaded once, at construction. After
/// that, drawing a frame is pure arithmetic over the camera position plus one
/// draw call per placed block.
pub struct Clipmap<B: GraphicsBackend> {
    assembler: ClipmapAssembler,
    stitching: StripStitching,
    blocks: [Block<B>; MeshShape::COUNT],
    program: B::Program,
    /// Draw every ring as lines. Has no effect on geometry.
    pub wireframe: bool,
}

impl<B: GraphicsBackend> Clipmap<B> {
    /// Validate the configuration, build every block mesh and upload it.
    pub fn new(backend: &mut B, config: &ClipmapConfig) -> Result<Self, ClipmapError> {
        let layout = ClipmapLayout::new(config.segments, config.segment_size, config.border_tiles)?;
        let assembler = ClipmapAssembler::new(
            layout,
            config.min_level,
            config.levels,
            config.connectors.into(),
        )?;
        let stitching = StripStitching::from(config.stitching);
        let factory = TileMeshFactory::new(stitching);

        let mut blocks = MeshShape::ALL.map(Block::new);
        for block in &mut blocks {
            let mesh = factory.generate_shape(&layout, block.shape())?;
            block.upload(backend, &mesh)?;
            log::debug!(
                "Uploaded {} ({}x{}): {} vertices, {} indices",
                block.shape().label(),
                mesh.rows,
                mesh.columns,
                mesh.vertex_count(),
                mesh.index_count()
            );
        }

        let program =
            backend
                .create_program(PROGRAM_NAME)
                .map_err(|e| ClipmapError::ShaderFailure {
                    name: PROGRAM_NAME.to_string(),
                    message: e.to_string(),
                })?;

        log::info!(
            "Clipmap ready: levels {}..={}, {} segments of {} per tile, {:?}, {:?} connectors",
            config.min_level,
            config.levels,
            config.segments,
            config.segment_size,
            config.stitching,
            config.connectors
        );

        Ok(Self {
            assembler,
            stitching,
            blocks,
            program,
            wireframe: false,
        })
    }

    /// Build from a full [`Config`], taking the wireframe toggle from its
    /// render section.
    pub fn from_config(backend: &mut B, config: &Config) -> Result<Self, ClipmapError> {
        let mut clipmap = Self::new(backend, &config.clipmap)?;
        clipmap.wireframe = config.render.wireframe;
        Ok(clipmap)
    }

    pub fn assembler(&self) -> &ClipmapAssembler {
        &self.assembler
    }

    pub fn stitching(&self) -> StripStitching {
        self.stitching
    }

    pub fn block(&self, shape: MeshShape) -> &Block<B> {
        &self.blocks[shape.index()]
    }

    /// Draw every ring for this frame. Shadow passes draw nothing.
    pub fn draw(&self, backend: &mut B, frame: &FrameContext<'_>) -> Result<FrameStats, ClipmapError> {
        if frame.shadow_pass {
            return Ok(FrameStats::default());
        }

        let camera = frame.camera;
        backend.use_program(&self.program);
        backend.set_uniform(Uniform::View(camera.view_matrix()));
        backend.set_uniform(Uniform::Projection(camera.projection_matrix()));
        backend.set_primitive_restart(match self.stitching {
            StripStitching::PrimitiveRestart => Some(PRIMITIVE_RESTART),
            StripStitching::DegenerateTriangles => None,
        });
        if self.wireframe {
            backend.set_fill_mode(FillMode::Wireframe);
        }

        let mut stats = FrameStats::default();
        let mut current_level = None;
        let result = self.assembler.visit(camera.ground_position(), |placement| {
            if current_level != Some(placement.level) {
                backend.set_uniform(Uniform::Level(placement.normalized_level));
                current_level = Some(placement.level);
                stats.levels += 1;
            }
            backend.set_uniform(Uniform::Model(placement.model_matrix()));
            self.blocks[placement.shape.index()].draw(backend)?;
            stats.record(placement.shape);
            Ok(())
        });

        if self.wireframe {
            backend.set_fill_mode(FillMode::Fill);
        }
        result?;

        log::trace!(
            "Clipmap frame: {} draws over {} levels",
            stats.draw_calls(),
            stats.levels
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CameraView;
    use crate::recording::{Command, RecordingBackend};
    use glam::{Mat4, Vec3};
    use horizon_config::ConnectorCoverage;

    struct TestCamera {
        position: Vec3,
    }

    impl CameraView for TestCamera {
        fn world_position(&self) -> Vec3 {
            self.position
        }
        fn view_matrix(&self) -> Mat4 {
            Mat4::look_at_rh(self.position, Vec3::ZERO, Vec3::Y)
        }
        fn projection_matrix(&self) -> Mat4 {
            Mat4::perspective_rh(1.0, 16.0 / 9.0, 0.1, 1000.0)
        }
    }

    fn camera() -> TestCamera {
        TestCamera {
            position: Vec3::new(7.0, 50.0, -3.0),
        }
    }

    fn build(config: &ClipmapConfig) -> (RecordingBackend, Clipmap<RecordingBackend>) {
        let mut backend = RecordingBackend::new();
        let clipmap = Clipmap::new(&mut backend, config).unwrap();
        (backend, clipmap)
    }

    #[test]
    fn test_construction_uploads_every_shape() {
        let (backend, clipmap) = build(&ClipmapConfig::default());
        let labels: Vec<&str> = backend.uploads().iter().map(|u| u.label.as_str()).collect();
        let expected: Vec<&str> = MeshShape::ALL.iter().map(|s| s.label()).collect();
        assert_eq!(labels, expected);
        assert_eq!(backend.programs(), &[PROGRAM_NAME.to_string()]);
        assert!(backend.commands().is_empty());
        for shape in MeshShape::ALL {
            assert!(clipmap.block(shape).is_uploaded());
        }
        assert_eq!(clipmap.block(MeshShape::HorizontalConnector).vertex_count(), 18);
        assert_eq!(clipmap.block(MeshShape::CenterFixup).vertex_count(), 9);
    }

    #[test]
    fn test_reference_frame_counts() {
        let (mut backend, clipmap) = build(&ClipmapConfig::default());
        let camera = camera();
        let stats = clipmap.draw(&mut backend, &FrameContext::new(&camera)).unwrap();

        assert_eq!(stats.levels, 4);
        assert_eq!(stats.count(MeshShape::Tile), 52);
        assert_eq!(stats.count(MeshShape::RowFixup), 10);
        assert_eq!(stats.count(MeshShape::ColumnFixup), 10);
        assert_eq!(stats.count(MeshShape::CenterFixup), 1);
        assert_eq!(stats.count(MeshShape::HorizontalConnector), 3);
        assert_eq!(stats.count(MeshShape::VerticalConnector), 3);
        assert_eq!(stats.draw_calls(), 79);
        assert_eq!(backend.draw_calls(), 79);
        assert!(backend.binds_balanced());
    }

    #[test]
    fn test_frame_preamble() {
        let (mut backend, clipmap) = build(&ClipmapConfig::default());
        let camera = camera();
        clipmap.draw(&mut backend, &FrameContext::new(&camera)).unwrap();

        let commands = backend.commands();
        assert!(matches!(commands[0], Command::UseProgram(_)));
        assert_eq!(commands[1], Command::SetUniform(Uniform::View(camera.view_matrix())));
        assert_eq!(
            commands[2],
            Command::SetUniform(Uniform::Projection(camera.projection_matrix()))
        );
        assert_eq!(commands[3], Command::SetPrimitiveRestart(Some(PRIMITIVE_RESTART)));
        assert_eq!(commands[4], Command::SetUniform(Uniform::Level(0.0)));
        assert!(!commands.iter().any(|c| matches!(c, Command::SetFillMode(_))));
    }

    #[test]
    fn test_level_uniform_set_once_per_level() {
        let (mut backend, clipmap) = build(&ClipmapConfig::default());
        let camera = camera();
        clipmap.draw(&mut backend, &FrameContext::new(&camera)).unwrap();

        let levels: Vec<f32> = backend
            .commands()
            .iter()
            .filter_map(|c| match c {
                Command::SetUniform(Uniform::Level(l)) => Some(*l),
                _ => None,
            })
            .collect();
        assert_eq!(levels, vec![0.0, 1.0 / 3.0, 2.0 / 3.0, 1.0]);
    }

    #[test]
    fn test_every_draw_has_its_own_model_matrix() {
        let (mut backend, clipmap) = build(&ClipmapConfig::default());
        let camera = camera();
        clipmap.draw(&mut backend, &FrameContext::new(&camera)).unwrap();

        let commands = backend.commands();
        for (i, command) in commands.iter().enumerate() {
            if matches!(command, Command::DrawStrip { .. }) {
                assert!(matches!(commands[i - 1], Command::BindMesh(_)));
                assert!(matches!(
                    commands[i - 2],
                    Command::SetUniform(Uniform::Model(_))
                ));
            }
        }
    }

    #[test]
    fn test_shadow_pass_draws_nothing() {
        let (mut backend, clipmap) = build(&ClipmapConfig::default());
        let camera = camera();
        let stats = clipmap
            .draw(&mut backend, &FrameContext::shadow(&camera))
            .unwrap();
        assert_eq!(stats, FrameStats::default());
        assert!(backend.commands().is_empty());
    }

    #[test]
    fn test_wireframe_is_set_and_restored() {
        let (mut backend, mut clipmap) = build(&ClipmapConfig::default());
        clipmap.wireframe = true;
        let camera = camera();
        clipmap.draw(&mut backend, &FrameContext::new(&camera)).unwrap();

        let modes: Vec<FillMode> = backend
            .commands()
            .iter()
            .filter_map(|c| match c {
                Command::SetFillMode(m) => Some(*m),
                _ => None,
            })
            .collect();
        assert_eq!(modes, vec![FillMode::Wireframe, FillMode::Fill]);
        assert_eq!(
            backend.commands().last(),
            Some(&Command::SetFillMode(FillMode::Fill))
        );
    }

    #[test]
    fn test_wireframe_does_not_change_geometry() {
        let (mut backend, mut clipmap) = build(&ClipmapConfig::default());
        let camera = camera();
        let filled = clipmap.draw(&mut backend, &FrameContext::new(&camera)).unwrap();
        clipmap.wireframe = true;
        let wire = clipmap.draw(&mut backend, &FrameContext::new(&camera)).unwrap();
        assert_eq!(filled, wire);
    }

    #[test]
    fn test_degenerate_stitching_disables_restart() {
        let config = ClipmapConfig {
            stitching: horizon_config::StripStitching::DegenerateTriangles,
            ..ClipmapConfig::default()
        };
        let (mut backend, clipmap) = build(&config);
        let camera = camera();
        clipmap.draw(&mut backend, &FrameContext::new(&camera)).unwrap();
        assert!(backend.commands().contains(&Command::SetPrimitiveRestart(None)));
    }

    #[test]
    fn test_horizontal_only_connectors() {
        let config = ClipmapConfig {
            connectors: ConnectorCoverage::HorizontalOnly,
            ..ClipmapConfig::default()
        };
        let (mut backend, clipmap) = build(&config);
        let camera = camera();
        let stats = clipmap.draw(&mut backend, &FrameContext::new(&camera)).unwrap();
        assert_eq!(stats.count(MeshShape::VerticalConnector), 0);
        assert_eq!(stats.draw_calls(), 76);
    }

    #[test]
    fn test_settings_map_onto_geometry_strategies() {
        let config = ClipmapConfig {
            connectors: ConnectorCoverage::HorizontalOnly,
            stitching: horizon_config::StripStitching::DegenerateTriangles,
            ..ClipmapConfig::default()
        };
        let (_, clipmap) = build(&config);
        assert_eq!(
            clipmap.assembler().connectors(),
            crate::assembler::ConnectorCoverage::HorizontalOnly
        );
        assert_eq!(clipmap.stitching(), StripStitching::DegenerateTriangles);

        let (_, clipmap) = build(&ClipmapConfig::default());
        assert_eq!(
            clipmap.assembler().connectors(),
            crate::assembler::ConnectorCoverage::Both
        );
        assert_eq!(clipmap.stitching(), StripStitching::PrimitiveRestart);
    }

    #[test]
    fn test_from_config_reads_wireframe() {
        let mut config = Config::default();
        config.render.wireframe = true;
        let mut backend = RecordingBackend::new();
        let clipmap = Clipmap::from_config(&mut backend, &config).unwrap();
        assert!(clipmap.wireframe);
    }

    #[test]
    fn test_invalid_configuration_fails_before_upload() {
        let config = ClipmapConfig {
            min_level: 5,
            ..ClipmapConfig::default()
        };
        let mut backend = RecordingBackend::new();
        let result = Clipmap::new(&mut backend, &config);
        assert!(matches!(result, Err(ClipmapError::InvalidConfiguration { .. })));
        assert!(backend.uploads().is_empty());

        let config = ClipmapConfig {
            segment_size: -1.0,
            ..ClipmapConfig::default()
        };
        assert!(matches!(
            Clipmap::new(&mut backend, &config),
            Err(ClipmapError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_upload_failure_propagates() {
        let mut backend = RecordingBackend::rejecting_uploads();
        let result = Clipmap::new(&mut backend, &ClipmapConfig::default());
        assert!(matches!(
            result,
            Err(ClipmapError::UploadFailure {
                shape: MeshShape::Tile,
                ..
            })
        ));
    }

    #[test]
    fn test_program_failure_propagates() {
        let mut backend = RecordingBackend::rejecting_programs();
        let result = Clipmap::new(&mut backend, &ClipmapConfig::default());
        assert!(matches!(result, Err(ClipmapError::ShaderFailure { .. })));
    }

    #[test]
    fn test_frames_are_reproducible() {
        let (mut backend, clipmap) = build(&ClipmapConfig::default());
        let camera = camera();
        clipmap.draw(&mut backend, &FrameContext::new(&camera)).unwrap();
        let first = backend.take_commands();
        clipmap.draw(&mut backend, &FrameContext::new(&camera)).unwrap();
        assert_eq!(first, backend.take_commands());
    }
}
