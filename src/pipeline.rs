// Pipeline: runs one source file through all three stages and decides
// whether it produces artifacts. A file with any diagnostic produces no
// `.ob`/`.ext`/`.ent`. This is the crate's composition root, the one
// place all three stages' state (symbol table, images, diagnostics)
// comes together.

use log::{debug, info};

use crate::diagnostics::Diagnostics;
use crate::{emit, first_pass, preprocessor, resolve};

pub struct AssembledFile {
    /// Always produced: the macro-expanded `.am` text, distinct from the
    /// gated `.ob`/`.ext`/`.ent` artifacts.
    pub am_text: String,
    pub ob_text: Option<String>,
    pub ext_text: Option<String>,
    pub ent_text: Option<String>,
    pub diagnostics: Diagnostics,
}

impl AssembledFile {
    pub fn is_valid(&self) -> bool {
        !self.diagnostics.has_errors()
    }
}

/// Assembles one translation unit from its already-read `.as` source
/// text. `filename` is used only to anchor diagnostics and carries no
/// file-system meaning here: each file gets a fresh symbol table, macro
/// table, and image buffers, so nothing here depends on previous calls.
pub fn assemble_source(source: &str, filename: &str) -> AssembledFile {
    let mut diags = Diagnostics::new();

    debug!("{filename}: pre-processing");
    let pre = preprocessor::preprocess(source, filename);
    diags.extend(pre.diagnostics);

    debug!("{filename}: first pass");
    let fp = first_pass::run(&pre.text, filename, &pre.macro_names);
    let mut symbols = fp.symbols;
    let mut code = fp.code;
    let data = fp.data;
    diags.extend(fp.diagnostics);

    debug!("{filename}: second pass");
    let mut resolve_diags = Diagnostics::new();
    resolve::resolve(&fp.patches, &mut symbols, &mut code, &mut resolve_diags);
    diags.extend(resolve_diags);

    let valid = !diags.has_errors();
    let (ob_text, ext_text, ent_text) = if valid {
        (Some(emit::format_ob(fp.icf, fp.dcf, &code, &data)), emit::format_ext(&symbols), emit::format_ent(&symbols))
    } else {
        (None, None, None)
    };

    info!("{filename}: {} ({} diagnostic(s))", if valid { "ok" } else { "rejected" }, diags.error_count());

    AssembledFile { am_text: pre.text, ob_text, ext_text, ent_text, diagnostics: diags }
}
