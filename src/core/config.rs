use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub data_file: PathBuf,
    pub pretty: bool,          // Indent the JSON document
    pub exclusive_lock: bool,  // Hold `<data_file>.lock` while open
}

impl Config {
    pub fn with_data_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_file = path.into();
        self
    }

    pub fn lock_path(&self) -> PathBuf {
        let mut name = self.data_file.as_os_str().to_os_string();
        name.push(".lock");
        PathBuf::from(name)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_file: PathBuf::from("tabula.json"),
            pretty: true,
            exclusive_lock: true,
        }
    }
}
