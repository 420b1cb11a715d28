use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use sim_core::{ConfigError, ConfigSource, GameConfig, LevelLoadError, LevelSource, TileGrid};

pub(crate) const LEVEL_TILE_SIZE: f32 = 64.0;

const BUILTIN_LEVEL_PATH: &str = "<builtin>";
const BUILTIN_LEVEL_CSV: &str = "\
1,1,1,1,1,1,1,1,1,1,1,1
1,4,0,0,0,0,0,0,0,0,2,1
1,0,1,1,0,0,0,1,1,0,0,1
1,0,1,0,0,3,0,0,1,0,0,1
1,0,0,0,0,1,0,0,0,0,5,1
1,2,0,6,0,1,0,0,8,0,0,1
1,0,1,0,0,0,0,0,1,0,0,1
1,0,1,1,0,0,7,1,1,0,2,1
1,1,1,1,1,1,1,1,1,1,1,1
";

/// Config file on disk. The modification time drives hot reload.
#[derive(Debug, Clone)]
pub(crate) struct JsonConfigSource {
    path: PathBuf,
}

impl JsonConfigSource {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ConfigSource for JsonConfigSource {
    fn last_modified(&self) -> Option<SystemTime> {
        fs::metadata(&self.path)
            .and_then(|metadata| metadata.modified())
            .ok()
    }

    fn load(&self) -> Result<GameConfig, ConfigError> {
        let raw = fs::read_to_string(&self.path).map_err(|source| ConfigError::Read {
            path: self.path.clone(),
            source,
        })?;
        GameConfig::from_json_str(&raw)
    }
}

/// `level_0.csv`, `level_1.csv`, ... discovered once at startup. Discovery
/// stops at the first missing index.
#[derive(Debug, Clone, Default)]
pub(crate) struct CsvLevelSource {
    paths: Vec<PathBuf>,
}

impl CsvLevelSource {
    pub(crate) fn discover(levels_dir: &Path) -> Self {
        let paths = (0..)
            .map(|index| levels_dir.join(format!("level_{index}.csv")))
            .take_while(|path| path.is_file())
            .collect();
        Self { paths }
    }
}

impl LevelSource for CsvLevelSource {
    fn level_count(&self) -> usize {
        self.paths.len()
    }

    fn load_level(&self, index: usize) -> Result<TileGrid, LevelLoadError> {
        let path = self.paths.get(index).ok_or(LevelLoadError::OutOfRange {
            index,
            count: self.paths.len(),
        })?;
        let text = fs::read_to_string(path).map_err(|source| LevelLoadError::Io {
            path: path.clone(),
            source,
        })?;
        parse_tilemap_csv(path, &text, LEVEL_TILE_SIZE)
    }
}

/// Parses comma-separated rows of tile ids. Blank lines are skipped and every
/// row must match the width of the first.
pub(crate) fn parse_tilemap_csv(
    path: &Path,
    text: &str,
    tile_size: f32,
) -> Result<TileGrid, LevelLoadError> {
    let parse_error = |line: usize, message: String| LevelLoadError::Parse {
        path: path.to_path_buf(),
        line,
        message,
    };

    let mut tiles = Vec::new();
    let mut width = 0usize;
    let mut height = 0usize;
    for (line_index, line) in text.lines().enumerate() {
        let line_number = line_index + 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let row = line
            .split(',')
            .map(|cell| {
                let cell = cell.trim();
                cell.parse::<u16>()
                    .map_err(|error| parse_error(line_number, format!("tile id {cell:?}: {error}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if height == 0 {
            width = row.len();
        } else if row.len() != width {
            return Err(parse_error(
                line_number,
                format!("row has {} columns, expected {width}", row.len()),
            ));
        }
        tiles.extend(row);
        height += 1;
    }

    let width = u32::try_from(width).map_err(|_| parse_error(1, "too many columns".to_string()))?;
    let height = u32::try_from(height).map_err(|_| parse_error(1, "too many rows".to_string()))?;
    Ok(TileGrid::new(width, height, tile_size, tiles)?)
}

pub(crate) fn builtin_level() -> Result<TileGrid, LevelLoadError> {
    parse_tilemap_csv(
        Path::new(BUILTIN_LEVEL_PATH),
        BUILTIN_LEVEL_CSV,
        LEVEL_TILE_SIZE,
    )
}
