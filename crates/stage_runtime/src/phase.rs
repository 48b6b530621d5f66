//! The fixed lifecycle phase enumeration.

/// One stage of the lifecycle. The set is fixed: phases are not extensible
/// at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Runs once, before the first tick.
    Init,
    /// First of the three per-tick phases.
    PreUpdate,
    /// Main per-tick phase.
    Update,
    /// Last of the three per-tick phases.
    PostUpdate,
    /// Per-tick presentation phase.
    Draw,
    /// Runs once, when the manager ends its lifecycle.
    End,
}

impl Phase {
    /// All phases in lifecycle order.
    pub const ALL: [Phase; 6] = [
        Phase::Init,
        Phase::PreUpdate,
        Phase::Update,
        Phase::PostUpdate,
        Phase::Draw,
        Phase::End,
    ];

    /// The phases a single `update()` call runs, in order. Each list is
    /// exhausted fully before the next begins.
    pub const UPDATE_SEQUENCE: [Phase; 3] = [Phase::PreUpdate, Phase::Update, Phase::PostUpdate];

    /// Index of this phase into per-phase tables.
    #[must_use]
    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Init => "Init",
            Phase::PreUpdate => "PreUpdate",
            Phase::Update => "Update",
            Phase::PostUpdate => "PostUpdate",
            Phase::Draw => "Draw",
            Phase::End => "End",
        };
        f.write_str(name)
    }
}
