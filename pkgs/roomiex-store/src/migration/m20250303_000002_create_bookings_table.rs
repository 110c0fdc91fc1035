use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Bookings {
    Table,
    Id,
    RoomId,
    UserId,
    OwnerId,
    BookingType,
    PreferredDate,
    PreferredTime,
    Message,
    Status,
    CreatedAt,
    UpdatedAt,
}

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250303_000002_create_bookings_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Bookings::Table)
                    .col(
                        ColumnDef::new(Bookings::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Bookings::RoomId).string().not_null())
                    .col(ColumnDef::new(Bookings::UserId).string().not_null())
                    .col(ColumnDef::new(Bookings::OwnerId).string().not_null())
                    .col(ColumnDef::new(Bookings::BookingType).string().not_null())
                    .col(ColumnDef::new(Bookings::PreferredDate).string().not_null())
                    .col(ColumnDef::new(Bookings::PreferredTime).string().not_null())
                    .col(ColumnDef::new(Bookings::Message).string())
                    .col(
                        ColumnDef::new(Bookings::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Bookings::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Bookings::UpdatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Bookings::Table).to_owned())
            .await
    }
}
