use api::{Diagnostic, DiagnosticSink};
use log::{debug, info};

/// Forwards binding diagnostics to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&self, event: &Diagnostic) {
        match event {
            Diagnostic::ChannelCoverage {
                bound,
                total,
                numeric_fallback,
                unmatched,
            } => {
                if *numeric_fallback {
                    info!("Bound {}/{} expression channels by slot index", bound, total);
                } else {
                    info!("Bound {}/{} expression channels", bound, total);
                }
                if !unmatched.is_empty() {
                    debug!("Unmatched channels: {:?}", unmatched);
                }
            }
            Diagnostic::SkeletonCoverage {
                bound,
                total,
                missing,
            } => {
                info!("Bound {}/{} skeleton joints", bound, total);
                if !missing.is_empty() {
                    debug!("Missing joints: {:?}", missing);
                }
            }
            Diagnostic::RigBound {
                rig,
                morph_slots,
                bones,
            } => {
                info!(
                    "Rig {} bound ({} morph slots, {} bones)",
                    rig, morph_slots, bones
                );
            }
        }
    }
}
