//! An optional diagnostic channel for conditions the parser tolerates
//! rather than rejects (§7 unknown blend modes; §9 ignored/opaque
//! properties).
//!
//! Grounded on the teacher's own soft-failure philosophy: an unrecognized
//! property tag is stored as `PropertyPayload::Opaque` rather than
//! rejected, the same way `doc::layer` keeps decoding past fields it
//! doesn't know. No `log`/`tracing` dependency is introduced for this —
//! nothing in the corpus reaches for one in a pure parsing library; a host
//! that wants structured logs implements `Diagnostics` itself.

/// Default methods are no-ops; implement only the hooks a caller cares
/// about.
pub trait Diagnostics {
    /// A layer's `MODE` property named an id outside the known blend-mode
    /// range; the caller falls back to `Normal` (§7).
    fn unknown_blend_mode(&mut self, id: u32) {
        let _ = id;
    }

    /// A property tag this parser doesn't interpret was stored verbatim as
    /// `PropertyPayload::Opaque` rather than decoded.
    fn opaque_property(&mut self, tag: u32) {
        let _ = tag;
    }
}

/// The default [`Diagnostics`] implementation: discards every hook.
pub struct NoopDiagnostics;

impl Diagnostics for NoopDiagnostics {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingDiagnostics {
        unknown_blend_modes: Vec<u32>,
        opaque_properties: Vec<u32>,
    }

    impl Diagnostics for CountingDiagnostics {
        fn unknown_blend_mode(&mut self, id: u32) {
            self.unknown_blend_modes.push(id);
        }

        fn opaque_property(&mut self, tag: u32) {
            self.opaque_properties.push(tag);
        }
    }

    #[test]
    fn noop_diagnostics_accepts_every_hook_without_panicking() {
        let mut diag = NoopDiagnostics;
        diag.unknown_blend_mode(999);
        diag.opaque_property(12345);
    }

    #[test]
    fn counting_diagnostics_records_calls() {
        let mut diag = CountingDiagnostics::default();
        diag.unknown_blend_mode(42);
        diag.opaque_property(7);
        assert_eq!(diag.unknown_blend_modes, vec![42]);
        assert_eq!(diag.opaque_properties, vec![7]);
    }
}
