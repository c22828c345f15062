use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("conflicting redeclarations of type '{name}' required by module '{module}'")]
    RedeclarationConflict { module: String, name: String },
}
