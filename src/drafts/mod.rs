pub(crate) mod phase;

pub(crate) use phase::{
    discard_phase_draft,
    get_phase_body_override,
    mark_phase_draft_synced,
    touch_phase_draft,
};
