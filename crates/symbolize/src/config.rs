/// Knobs for the streaming pipeline.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct PipelineConfig {
    /// Number of parsed lines that may wait for the consumer. The default of
    /// one keeps the producer at most a single line ahead.
    pub channel_capacity: usize,
    /// Drop a trailing `\r` from each line before parsing.
    pub strip_carriage_return: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1,
            strip_carriage_return: true,
        }
    }
}
