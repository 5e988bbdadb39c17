/// Switches read by the synthesis stage.
///
/// These come from the command line of the enclosing compiler; this crate
/// only consumes them.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SynthesisOptions {
    pub no_std_includes: bool,            // skip default fread/fwrite synthesis
    pub infer_field_types: bool,          // false: accessors and `=` carry field types eagerly
    pub assignment_as_method: bool,       // default `=` becomes a primary method on the receiver
    pub getters_for_type_variables: bool, // getters also for generic type parameters
}

impl SynthesisOptions {
    /// Options with type inference turned off: every synthesized accessor and
    /// assignment is typed from the declaration up front.
    pub fn no_infer() -> Self {
        SynthesisOptions {
            infer_field_types: false,
            ..Self::default()
        }
    }
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        SynthesisOptions {
            no_std_includes: false,
            infer_field_types: true,
            assignment_as_method: false,
            getters_for_type_variables: false,
        }
    }
}
