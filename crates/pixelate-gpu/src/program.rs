use std::fmt;

use thiserror::Error;

/// Full-screen vertex stage shared by every filter, one per shader language.
pub const FILTER_VERTEX_WGSL: &str = include_str!("shaders/filter_vertex.wgsl");
pub const FILTER_VERTEX_GLSL: &str = include_str!("shaders/filter.vert");

pub const PIXELATE_WGSL: &str = include_str!("shaders/pixelate.wgsl");
pub const PIXELATE_GLSL: &str = include_str!("shaders/pixelate.frag");

// ---------------------------------------------------------------------------
// Backend / Stage
// ---------------------------------------------------------------------------

/// Which shader representation a draw uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Modern explicit API, WGSL source.
    Gpu,
    /// Legacy API, GLSL source.
    Gl,
}

impl Backend {
    pub const ALL: [Backend; 2] = [Backend::Gpu, Backend::Gl];

    pub fn index(self) -> usize {
        match self {
            Backend::Gpu => 0,
            Backend::Gl => 1,
        }
    }

    pub fn language(self) -> &'static str {
        match self {
            Backend::Gpu => "wgsl",
            Backend::Gl => "glsl",
        }
    }

    pub fn other(self) -> Backend {
        match self {
            Backend::Gpu => Backend::Gl,
            Backend::Gl => Backend::Gpu,
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.language())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Vertex,
    Fragment,
}

impl Stage {
    pub fn naga(self) -> naga::ShaderStage {
        match self {
            Stage::Vertex => naga::ShaderStage::Vertex,
            Stage::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Vertex => "vertex",
            Stage::Fragment => "fragment",
        })
    }
}

// ---------------------------------------------------------------------------
// Programs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryPoints {
    pub vertex: &'static str,
    pub fragment: &'static str,
}

impl EntryPoints {
    /// Naming used by every WGSL filter.
    pub const WGSL: Self = Self {
        vertex: "mainVertex",
        fragment: "mainFragment",
    };
    /// GLSL always enters at `main`.
    pub const GLSL: Self = Self {
        vertex: "main",
        fragment: "main",
    };
}

/// Vertex + fragment source for one backend. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub name: &'static str,
    pub backend: Backend,
    pub vertex: &'static str,
    pub fragment: &'static str,
    pub entry_points: EntryPoints,
}

impl Program {
    /// A GPU-style program: WGSL with explicit entry points.
    pub fn gpu(
        name: &'static str,
        vertex: &'static str,
        fragment: &'static str,
        entry_points: EntryPoints,
    ) -> Self {
        Self {
            name,
            backend: Backend::Gpu,
            vertex,
            fragment,
            entry_points,
        }
    }

    /// A legacy-style program: GLSL, entry points implied.
    pub fn gl(name: &'static str, vertex: &'static str, fragment: &'static str) -> Self {
        Self {
            name,
            backend: Backend::Gl,
            vertex,
            fragment,
            entry_points: EntryPoints::GLSL,
        }
    }

    pub fn source(&self, stage: Stage) -> &'static str {
        match stage {
            Stage::Vertex => self.vertex,
            Stage::Fragment => self.fragment,
        }
    }

    pub fn entry_point(&self, stage: Stage) -> &'static str {
        match stage {
            Stage::Vertex => self.entry_points.vertex,
            Stage::Fragment => self.entry_points.fragment,
        }
    }

    /// Parse and validate one stage, returning the naga module.
    pub fn parse_stage(&self, stage: Stage) -> Result<naga::Module, ProgramError> {
        let source = self.source(stage);
        let module = match self.backend {
            Backend::Gpu => naga::front::wgsl::parse_str(source).map_err(|e| {
                self.error(stage, ProgramErrorKind::Parse(e.emit_to_string(source)))
            })?,
            Backend::Gl => {
                let options = naga::front::glsl::Options::from(stage.naga());
                naga::front::glsl::Frontend::default()
                    .parse(&options, source)
                    .map_err(|e| self.error(stage, ProgramErrorKind::Parse(format!("{e:?}"))))?
            }
        };

        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::empty(),
        )
        .validate(&module)
        .map_err(|e| self.error(stage, ProgramErrorKind::Invalid(e.emit_to_string(source))))?;

        let entry_point = self.entry_point(stage);
        let found = module
            .entry_points
            .iter()
            .any(|ep| ep.name == entry_point && ep.stage == stage.naga());
        if !found {
            return Err(self.error(
                stage,
                ProgramErrorKind::MissingEntryPoint(entry_point.to_string()),
            ));
        }
        Ok(module)
    }

    pub fn validate(&self) -> Result<(), ProgramError> {
        self.parse_stage(Stage::Vertex)?;
        self.parse_stage(Stage::Fragment)?;
        log::debug!("program {} ({}) validated", self.name, self.backend);
        Ok(())
    }

    pub(crate) fn error(&self, stage: Stage, kind: ProgramErrorKind) -> ProgramError {
        ProgramError {
            program: self.name,
            backend: self.backend,
            stage,
            kind,
        }
    }
}

/// The two backend programs of one logical effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramPair {
    pub gpu: Program,
    pub gl: Program,
}

impl ProgramPair {
    pub fn pixelate() -> Self {
        Self {
            gpu: Program::gpu(
                "pixelate-filter",
                FILTER_VERTEX_WGSL,
                PIXELATE_WGSL,
                EntryPoints::WGSL,
            ),
            gl: Program::gl("pixelate-filter", FILTER_VERTEX_GLSL, PIXELATE_GLSL),
        }
    }

    pub fn get(&self, backend: Backend) -> &Program {
        match backend {
            Backend::Gpu => &self.gpu,
            Backend::Gl => &self.gl,
        }
    }

    pub fn validate(&self) -> Result<(), ProgramError> {
        self.gpu.validate()?;
        self.gl.validate()
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
#[error("program `{program}` ({backend}) {stage} stage: {kind}")]
pub struct ProgramError {
    pub program: &'static str,
    pub backend: Backend,
    pub stage: Stage,
    pub kind: ProgramErrorKind,
}

#[derive(Debug, Error)]
pub enum ProgramErrorKind {
    #[error("parse failed\n{0}")]
    Parse(String),
    #[error("validation failed\n{0}")]
    Invalid(String),
    #[error("no entry point named `{0}`")]
    MissingEntryPoint(String),
    #[error("rejected by the device: {0}")]
    Device(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixelate_programs_validate() {
        ProgramPair::pixelate()
            .validate()
            .unwrap_or_else(|e| panic!("{e}"));
    }

    #[test]
    fn both_backends_share_one_name() {
        let pair = ProgramPair::pixelate();
        assert_eq!(pair.gpu.name, pair.gl.name);
        assert_eq!(pair.get(Backend::Gpu).backend, Backend::Gpu);
        assert_eq!(pair.get(Backend::Gl).backend, Backend::Gl);
    }

    #[test]
    fn entry_point_conventions() {
        let pair = ProgramPair::pixelate();
        assert_eq!(pair.gpu.entry_points, EntryPoints::WGSL);
        assert_eq!(pair.gl.entry_points, EntryPoints::GLSL);
    }

    #[test]
    fn broken_wgsl_is_a_parse_error() {
        let program = Program::gpu(
            "broken",
            FILTER_VERTEX_WGSL,
            "@fragment fn mainFragment( -> {",
            EntryPoints::WGSL,
        );
        let err = program.validate().unwrap_err();
        assert_eq!(err.stage, Stage::Fragment);
        assert!(matches!(err.kind, ProgramErrorKind::Parse(_)), "{err}");
    }

    #[test]
    fn broken_glsl_is_a_parse_error() {
        let program = Program::gl("broken", "#version 450\nvoid main() { oops }", PIXELATE_GLSL);
        let err = program.validate().unwrap_err();
        assert_eq!(err.backend, Backend::Gl);
        assert_eq!(err.stage, Stage::Vertex);
    }

    #[test]
    fn wrong_entry_point_is_reported() {
        let program = Program::gpu(
            "renamed",
            FILTER_VERTEX_WGSL,
            PIXELATE_WGSL,
            EntryPoints {
                vertex: "mainVertex",
                fragment: "fs_main",
            },
        );
        let err = program.validate().unwrap_err();
        assert!(
            matches!(&err.kind, ProgramErrorKind::MissingEntryPoint(name) if name == "fs_main"),
            "{err}"
        );
    }

    #[test]
    fn backend_helpers() {
        assert_eq!(Backend::Gpu.other(), Backend::Gl);
        assert_eq!(Backend::Gl.index(), 1);
        assert_eq!(Backend::Gpu.to_string(), "wgsl");
    }
}
