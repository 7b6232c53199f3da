//! Prompt text for script generation.

pub const SYSTEM_PROMPT: &str = "You write narration for short vertical videos. \
Watch the clip and write a punchy, curious voice-over of two to four sentences \
(under 60 words) that hooks the viewer in the first line. Plain text only: no \
hashtags, no emojis, no stage directions, no quotation marks.";

pub const USER_PROMPT: &str = "Write the narration for this video.";

/// Sampling temperature; high on purpose for varied scripts.
pub const TEMPERATURE: f32 = 1.5;
