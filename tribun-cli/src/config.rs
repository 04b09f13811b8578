//! Playout configuration

/// Configuration for a batch of random playouts
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayoutConfig {
    /// Number of games to play
    pub games: usize,
    /// Plies after which an unfinished game is abandoned
    pub max_plies: u32,
    /// Base seed; game `i` uses `seed + i` (None = random base)
    pub seed: Option<u64>,
    /// Whether to run games in parallel
    pub parallel: bool,
    /// Show a progress bar on stderr
    pub progress: bool,
}

impl Default for PlayoutConfig {
    fn default() -> Self {
        Self {
            games: 10,
            max_plies: 200,
            seed: None,
            parallel: true,
            progress: true,
        }
    }
}

impl PlayoutConfig {
    /// Create config for a number of games
    pub fn games(games: usize) -> Self {
        Self {
            games,
            ..Default::default()
        }
    }

    pub fn with_max_plies(mut self, max_plies: u32) -> Self {
        self.max_plies = max_plies;
        self
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }
}
