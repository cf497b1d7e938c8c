//! # Attribute Configurator
//!
//! Derives engine audio attributes from the output route and the
//! silent-switch policy.

use crate::config::OutputRoute;
use crate::error::Result;
use bridge_traits::{AudioAttributes, AudioRouteControl, PlaybackEngine, UsageCategory};
use tracing::{debug, warn};

/// Usage category for a route and policy.
///
/// Any route other than the loudspeaker uses the communication category, which
/// lets the platform move output to the earpiece or a bluetooth headset.
pub fn derive_usage(route: OutputRoute, respect_silence: bool) -> UsageCategory {
    match route {
        OutputRoute::Earpiece => UsageCategory::VoiceCommunication,
        OutputRoute::Speakers if respect_silence => UsageCategory::NotificationRingtone,
        OutputRoute::Speakers => UsageCategory::Media,
    }
}

/// Apply derived attributes to `engine`.
///
/// For communication usage the platform is also told to stop forcing the
/// speakerphone. A failing route control is logged and ignored; the attributes
/// already carry the routing intent.
pub fn apply_attributes(
    engine: &mut dyn PlaybackEngine,
    route: OutputRoute,
    respect_silence: bool,
    route_control: Option<&dyn AudioRouteControl>,
) -> Result<UsageCategory> {
    let usage = derive_usage(route, respect_silence);
    engine.set_audio_attributes(AudioAttributes::music(usage))?;
    debug!(?usage, %route, "Applied audio attributes");

    if usage.is_communication() {
        if let Some(control) = route_control {
            if let Err(e) = control.set_speakerphone_on(false) {
                warn!(error = %e, "Failed to disable speakerphone");
            }
        }
    }

    Ok(usage)
}
