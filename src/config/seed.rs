use error_stack::{Report, Result};
use serde::Deserialize;
use std::path::Path;

use super::ParseError;
use crate::database::SeedUser;
use crate::util::figment::FigmentErrorAttachable;

/// Data loaded into the in-memory store before the server starts.
#[derive(Debug, Default, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub users: Vec<SeedUser>,
}

impl Seed {
    pub fn load(path: &Path) -> Result<Self, ParseError> {
        use figment::{
            providers::{Format, Toml},
            Figment,
        };

        if !path.is_file() {
            return Err(Report::new(ParseError)
                .attach_printable(format!("seed file {} does not exist", path.display())));
        }

        Figment::from(Toml::file(path))
            .extract::<Self>()
            .map_err(|e| Report::new(ParseError).attach_figment_error(e))
    }
}
