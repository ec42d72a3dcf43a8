pub mod department;
pub mod doctor;
