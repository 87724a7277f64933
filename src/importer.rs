// Import orchestration: drives every archive entry through decode,
// translation, recipe creation and the best-effort image steps, one recipe
// at a time. Nothing here prints or logs; callers observe `ImportEvent`s.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::api::{ClientError, RecipeApi, RemoteResponse};
use crate::archive::{ArchiveError, RawEntry};
use crate::error::{ImageError, ImageStep, RecordError};
use crate::record::decode_entry;
use crate::translate::{display_value, PaprikaRecipe};

/// Extension sent along with embedded Paprika photos, which are JPEGs.
const EMBEDDED_IMAGE_EXTENSION: &str = "jpg";

#[derive(Debug)]
pub enum ImportEvent {
    /// The server created the recipe.
    Imported {
        index: usize,
        name: String,
        slug: String,
    },
    /// The recipe was skipped. `recipe` is the recipe name once the entry
    /// decoded, the archive entry name before that.
    Failed {
        index: usize,
        recipe: String,
        error: RecordError,
    },
    ImageAttached {
        slug: String,
        step: ImageStep,
    },
    ImageWarning {
        slug: String,
        error: ImageError,
    },
    /// Emitted once per entry, after all of its steps.
    Processed { index: usize },
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    pub attempted: usize,
    pub succeeded: usize,
}

impl ImportReport {
    pub fn failed(&self) -> usize {
        self.attempted - self.succeeded
    }
}

pub struct Importer<'a, A: ?Sized> {
    api: &'a A,
}

impl<'a, A: RecipeApi + ?Sized> Importer<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Importer { api }
    }

    /// Imports every entry in order. Record and image failures are reported
    /// through `on_event` and never stop the run.
    ///
    /// Running twice over the same archive creates every recipe twice; the
    /// server has no key to deduplicate on.
    pub fn run<I, F>(&self, entries: I, mut on_event: F) -> ImportReport
    where
        I: IntoIterator<Item = Result<RawEntry, ArchiveError>>,
        F: FnMut(ImportEvent),
    {
        let mut report = ImportReport::default();

        for (index, entry) in entries.into_iter().enumerate() {
            report.attempted += 1;
            let mut label = match &entry {
                Ok(raw) => raw.name.clone(),
                Err(_) => format!("entry #{}", index + 1),
            };

            match self.import_entry(index, entry, &mut label, &mut on_event) {
                Ok(()) => report.succeeded += 1,
                Err(error) => on_event(ImportEvent::Failed {
                    index,
                    recipe: label,
                    error,
                }),
            }
            on_event(ImportEvent::Processed { index });
        }

        report
    }

    fn import_entry<F>(
        &self,
        index: usize,
        entry: Result<RawEntry, ArchiveError>,
        label: &mut String,
        on_event: &mut F,
    ) -> Result<(), RecordError>
    where
        F: FnMut(ImportEvent),
    {
        let record = decode_entry(&entry?.bytes)?;
        if let Some(name) = record.get("name").filter(|name| !name.is_null()) {
            *label = display_value(name);
        }
        let source = PaprikaRecipe::from_record(&record)?;
        let recipe = source.to_mealie()?;

        let res = self
            .api
            .create_recipe(&recipe)
            .map_err(RecordError::Transport)?;
        if !res.ok {
            return Err(RecordError::Rejected {
                status: res.status,
                body: res.body,
            });
        }

        let slug = res.slug();
        on_event(ImportEvent::Imported {
            index,
            name: recipe.display_name(),
            slug: slug.to_string(),
        });
        self.attach_images(&source, slug, on_event);
        Ok(())
    }

    /// Uploads the embedded photo, then asks the server to fetch the
    /// original image, which replaces the low resolution export copy.
    fn attach_images<F>(&self, source: &PaprikaRecipe, slug: &str, on_event: &mut F)
    where
        F: FnMut(ImportEvent),
    {
        if let Some(data) = source.photo_data() {
            match STANDARD.decode(data) {
                Ok(image) => {
                    let res = self
                        .api
                        .upload_image(slug, image, EMBEDDED_IMAGE_EXTENSION);
                    if !report_image_step(slug, ImageStep::Upload, res, on_event) {
                        return;
                    }
                }
                Err(e) => on_event(ImportEvent::ImageWarning {
                    slug: slug.to_string(),
                    error: ImageError::EmbeddedImage(e),
                }),
            }
        }

        if let Some(url) = source.image_url() {
            let res = self.api.request_image_fetch(slug, url);
            report_image_step(slug, ImageStep::Fetch, res, on_event);
        }
    }
}

/// Emits the outcome of one image step. Returns false if the server could
/// not be reached, which ends the remaining steps for this recipe.
fn report_image_step<F>(
    slug: &str,
    step: ImageStep,
    res: Result<RemoteResponse, ClientError>,
    on_event: &mut F,
) -> bool
where
    F: FnMut(ImportEvent),
{
    let slug = slug.to_string();
    match res {
        Ok(res) if res.ok => {
            on_event(ImportEvent::ImageAttached { slug, step });
            true
        }
        Ok(res) => {
            on_event(ImportEvent::ImageWarning {
                slug,
                error: ImageError::Rejected {
                    step,
                    status: res.status,
                    body: res.body,
                },
            });
            true
        }
        Err(source) => {
            on_event(ImportEvent::ImageWarning {
                slug,
                error: ImageError::Transport { step, source },
            });
            false
        }
    }
}
