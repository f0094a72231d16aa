//! Hoist finalizer.
//!
//! Flushes every statement-list accumulator in registration order. Text mode
//! inserts the combined code at the list's insertion offset; the returned plan
//! carries the same code to the structural rewriter.

use oxc_span::Span;

use crate::scope::BodyKey;
use crate::transform::ModuleTransformer;

/// Generated code for one statement list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoistedBody {
    pub key: BodyKey,
    pub insert_index: usize,
    pub code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HoistPlan {
    pub bodies: Vec<HoistedBody>,
    /// Single-statement slots that must become blocks.
    pub wrapped: Vec<Span>,
}

impl<'s> ModuleTransformer<'s> {
    pub(crate) fn finalize(&mut self) -> HoistPlan {
        let mut plan = HoistPlan::default();

        for info in self.bodies.infos() {
            if let BodyKey::Wrapped(span) = info.key {
                plan.wrapped.push(span);
            }

            let code = info.hoisted_code(&self.options);
            if code.is_empty() {
                continue;
            }
            tracing::trace!(
                container = ?info.key,
                offset = info.insert_offset,
                index = info.insert_index,
                "hoisting generated code"
            );
            if info.needs_separator {
                self.editor
                    .insert(info.insert_offset, &format!(";{}", code), false);
            } else {
                self.editor.insert(info.insert_offset, &code, false);
            }
            plan.bodies.push(HoistedBody {
                key: info.key,
                insert_index: info.insert_index,
                code,
            });
        }

        tracing::debug!(
            bodies = plan.bodies.len(),
            wrapped = plan.wrapped.len(),
            keys = self.next_key,
            "finalized module"
        );
        self.bodies.clear();
        plan
    }
}
