// Library root
// -----------
// Imports recipes from a Paprika export archive into a Mealie server.
//
// Module responsibilities:
// - `archive`: opens the `.paprikarecipes` zip and hands out raw entries.
// - `record`: gunzips one entry and parses it as a JSON object.
// - `translate`: turns a Paprika record into a Mealie recipe body.
// - `api`: authenticated blocking client for the Mealie REST API.
// - `importer`: per-recipe pipeline, outcome events and the final report.
// - `error`: fatal, per-record and image failure classes.
// - `ui`: the terminal side: prompts, logging, progress bar and summary.
//
// Everything below `ui` is free of console and log output, so the import
// pipeline can be driven from tests or another front end.
pub mod api;
pub mod archive;
pub mod error;
pub mod importer;
pub mod record;
pub mod translate;
pub mod ui;
