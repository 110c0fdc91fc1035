use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum FlatmateProfiles {
    Table,
    UserId,
    LookingForRoom,
    BudgetMin,
    BudgetMax,
    PreferredLocation,
    MoveInDate,
    Occupation,
    AgeRange,
    Bio,
    LifestyleJson,
    CreatedAt,
    UpdatedAt,
}

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250304_000001_create_flatmate_profiles_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FlatmateProfiles::Table)
                    .col(
                        ColumnDef::new(FlatmateProfiles::UserId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(FlatmateProfiles::LookingForRoom)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(FlatmateProfiles::BudgetMin).double())
                    .col(ColumnDef::new(FlatmateProfiles::BudgetMax).double())
                    .col(ColumnDef::new(FlatmateProfiles::PreferredLocation).string())
                    .col(ColumnDef::new(FlatmateProfiles::MoveInDate).string())
                    .col(ColumnDef::new(FlatmateProfiles::Occupation).string())
                    .col(ColumnDef::new(FlatmateProfiles::AgeRange).string())
                    .col(ColumnDef::new(FlatmateProfiles::Bio).string())
                    .col(
                        ColumnDef::new(FlatmateProfiles::LifestyleJson)
                            .string()
                            .not_null()
                            .default("{}"),
                    )
                    .col(
                        ColumnDef::new(FlatmateProfiles::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FlatmateProfiles::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_flatmate_profiles_looking_created")
                    .table(FlatmateProfiles::Table)
                    .col(FlatmateProfiles::LookingForRoom)
                    .col(FlatmateProfiles::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FlatmateProfiles::Table).to_owned())
            .await
    }
}
