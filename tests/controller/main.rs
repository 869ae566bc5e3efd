mod monitoring;
mod sessions;
