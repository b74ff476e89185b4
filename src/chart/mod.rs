/// Chart model: backend-independent layout of one sheet's grouped bars.
///
/// ```text
///   SheetStats ──► spec::build ──► ChartSpec ──► render / ui
///                      │
///                      └── annotate (threshold markers, std-dev labels)
/// ```

pub mod annotate;
pub mod spec;
