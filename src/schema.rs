use sea_query::Iden;

/// Users table - account records with usage accounting
#[derive(Iden)]
pub enum Users {
    Table,
    Id,
    Name,
    Email,
    PasswordHash,
    CreatedAt,
    UsageCount,
    IsAdmin,
}

/// Transcriptions table - saved transcription history, one row per completed
/// transcription, immutable after insert
#[derive(Iden)]
pub enum Transcriptions {
    Table,
    Id,
    UserId,
    Filename,
    RawTranscription,
    Summary,
    CreatedAt,
}
