use csv::Reader;
use serde::de::DeserializeOwned;
use std::{
    io::{Cursor, Read, Seek},
    time::Instant,
};
use thiserror::Error;
use tracing::{debug, trace};
use zip::ZipArchive;

mod config;
mod data;
pub mod models;
pub use config::*;
pub use data::*;
pub use models::*;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("Csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Could not find file with name: {0}")]
    FileNotFound(String),
}

#[derive(Default)]
pub enum StorageType {
    #[default]
    None,
    Bytes(Vec<u8>),
}

/// A static feed archive waiting to be decoded.
#[derive(Default)]
pub struct Feed {
    config: Config,
    storage: StorageType,
}

impl Feed {
    pub fn new(config: self::Config) -> Self {
        Self {
            config,
            storage: Default::default(),
        }
    }

    /// Archive already held in memory, typically a fresh download.
    pub fn from_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.storage = StorageType::Bytes(bytes);
        self
    }

    /// Decodes routes, stops, trips and shapes. Every other member of the
    /// archive is skipped.
    pub fn read(self) -> Result<FeedData, self::Error> {
        let now = Instant::now();
        let data = match self.storage {
            StorageType::None => FeedData::default(),
            StorageType::Bytes(bytes) => {
                read_archive(&self.config, ZipArchive::new(Cursor::new(bytes))?)?
            }
        };
        debug!(
            "Reading feed took {:?} ({} routes, {} stops, {} trips, {} shape points)",
            now.elapsed(),
            data.routes.len(),
            data.stops.len(),
            data.trips.len(),
            data.shapes.len()
        );
        Ok(data)
    }
}

fn read_archive<R>(config: &Config, mut archive: ZipArchive<R>) -> Result<FeedData, self::Error>
where
    R: Read + Seek,
{
    for required in [&config.routes_file_name, &config.stops_file_name] {
        if archive.index_for_name(required).is_none() {
            return Err(self::Error::FileNotFound(required.clone()));
        }
    }

    let mut tables = Vec::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let name = file.name().to_owned();
        let table = match name.as_str() {
            val if val == config.routes_file_name => FeedTable::Routes(parse_csv(&mut file)?),
            val if val == config.stops_file_name => FeedTable::Stops(parse_csv(&mut file)?),
            val if val == config.trips_file_name => FeedTable::Trips(parse_csv(&mut file)?),
            val if val == config.shapes_file_name => FeedTable::Shapes(parse_csv(&mut file)?),
            _ => {
                trace!("Skipping {name}");
                FeedTable::Unknown
            }
        };
        tables.push(table);
    }
    Ok(tables.into())
}

fn parse_csv<R, T>(reader: &mut R) -> Result<Vec<T>, self::Error>
where
    R: Read,
    T: DeserializeOwned,
{
    let mut rdr = Reader::from_reader(reader);
    let mut buf = Vec::new();
    for result in rdr.deserialize() {
        let record: T = result?;
        buf.push(record);
    }
    Ok(buf)
}
