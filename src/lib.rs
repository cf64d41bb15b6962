pub mod config;
pub mod error;
pub mod events;
pub mod view;
pub mod processing {
    pub mod blur;
    pub mod canvas;
    pub mod composite;
    pub mod layout;
    pub mod resize;
    pub mod shadow;
}
pub mod tasks {
    pub mod blur_worker;
}
